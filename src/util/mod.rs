pub mod alphabet;
pub mod dna;
pub mod gencode;
pub mod lprob;
