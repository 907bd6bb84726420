use anyhow::{anyhow, Context, Result};
use std::io::BufRead;

/// 一条目标序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        let header = match self.peek_header.take() {
            Some(h) => h,
            None => loop {
                self.buf.clear();
                if self.reader.read_line(&mut self.buf)? == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(h) = self.buf.strip_prefix('>') {
                    break h.trim().to_string();
                }
            },
        };

        let (id, desc) = match header.split_once(char::is_whitespace) {
            Some((id, rest)) => {
                let rest = rest.trim();
                (id.to_string(), (!rest.is_empty()).then(|| rest.to_string()))
            }
            None => (header, None),
        };

        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                self.done = true;
                break;
            }
            if let Some(h) = self.buf.strip_prefix('>') {
                self.peek_header = Some(h.trim().to_string());
                break;
            }
            // 旧式 ';' 注释行
            if self.buf.starts_with(';') {
                continue;
            }
            seq.extend(
                self.buf
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase()),
            );
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// 读出文件中全部记录
pub fn read_records(path: &str) -> Result<Vec<FastaRecord>> {
    let fh = std::fs::File::open(path).map_err(|e| anyhow!("cannot open FASTA file '{}': {}", path, e))?;
    FastaReader::new(std::io::BufReader::new(fh))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("reading '{}'", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(data: &'static [u8]) -> FastaReader<Cursor<&'static [u8]>> {
        FastaReader::new(Cursor::new(data))
    }

    #[test]
    fn parse_protein_records() {
        let mut r = reader(b">sp|P1| first protein\nPGKed\nNNK\n>q2\nKKK\n");

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "sp|P1|");
        assert_eq!(r1.desc.as_deref(), Some("first protein"));
        assert_eq!(r1.seq, b"PGKEDNNK");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "q2");
        assert_eq!(r2.desc, None);
        assert_eq!(r2.seq, b"KKK");

        assert!(r.next_record().unwrap().is_none());
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn crlf_whitespace_and_comments() {
        let r: Vec<FastaRecord> = reader(b"\n\n>n1 desc\r\nAC g u\r\n;note\r\n acgt\r\n>n2 \r\n N N \r\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].id, "n1");
        assert_eq!(r[0].desc.as_deref(), Some("desc"));
        assert_eq!(r[0].seq, b"ACGUACGT");
        assert_eq!(r[1].desc, None);
        assert_eq!(r[1].seq, b"NN");
    }

    #[test]
    fn empty_record_is_kept() {
        let r: Vec<FastaRecord> = reader(b">empty\n>full\nAAA\n").collect::<Result<_>>().unwrap();
        assert_eq!(r.len(), 2);
        assert!(r[0].seq.is_empty());
        assert_eq!(r[1].seq, b"AAA");
    }

    #[test]
    fn missing_file_is_error() {
        let err = read_records("/nonexistent/targets.fa").unwrap_err();
        assert!(err.to_string().contains("cannot open FASTA file"));
    }
}
