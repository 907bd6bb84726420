pub mod fasta;
pub mod hmmer;
