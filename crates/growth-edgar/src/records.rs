//! Tab-separated record reading.

use chrono::NaiveDate;
use csv::{ByteRecord, StringRecord};
use std::io::{self, Read};
use tracing::{trace, warn};

/// One record of a data set file.
#[derive(Debug, Clone)]
pub enum Record {
    /// A record whose bytes decoded as UTF-8.
    Fields(StringRecord),
    /// A record that could not be decoded.
    Unreadable,
}

/// Iterator over the tab-separated records of a data set file.
///
/// The SEC files are not quoted, so quote characters are treated as data and
/// rows may have any number of fields. An I/O error ends the iteration after
/// yielding a single [`Record::Unreadable`].
///
/// Blank lines carry no record. Each one is reported as a
/// [`Record::Unreadable`] once the last record has been read.
#[derive(Debug)]
pub struct TsvRecords<R> {
    reader: csv::Reader<BlankLines<R>>,
    finished: bool,
    blank: usize,
}

/// Counts lines that hold nothing but their terminator as the bytes pass through.
#[derive(Debug)]
struct BlankLines<R> {
    inner: R,
    blank: usize,
    content: bool,
}

impl<R: Read> Read for BlankLines<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for &b in &buf[..n] {
            match b {
                b'\n' => {
                    if !self.content {
                        self.blank += 1;
                    }
                    self.content = false;
                }
                b'\r' => {}
                _ => self.content = true,
            }
        }
        Ok(n)
    }
}

impl<R: Read> TsvRecords<R> {
    /// Wraps a reader.
    pub fn new(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .has_headers(false)
            .from_reader(BlankLines {
                inner: reader,
                blank: 0,
                content: false,
            });
        Self {
            reader,
            finished: false,
            blank: 0,
        }
    }
}

impl<R: Read> Iterator for TsvRecords<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.finished {
            if self.blank == 0 {
                return None;
            }
            self.blank -= 1;
            return Some(Record::Unreadable);
        }

        let mut raw = ByteRecord::new();
        match self.reader.read_byte_record(&mut raw) {
            Ok(false) => {
                self.finished = true;
                self.blank = self.reader.get_ref().blank;
                if self.blank > 0 {
                    trace!(blank = self.blank, "Blank lines in input");
                }
                self.next()
            }
            Ok(true) => match StringRecord::from_byte_record(raw) {
                Ok(record) => Some(Record::Fields(record)),
                Err(e) => {
                    trace!(field = e.utf8_error().field(), "Record is not valid UTF-8");
                    Some(Record::Unreadable)
                }
            },
            Err(e) => {
                warn!(error = %e, "Stopped reading records");
                self.finished = true;
                Some(Record::Unreadable)
            }
        }
    }
}

/// Parses an 8-digit `YYYYMMDD` date field.
#[must_use]
pub fn parse_yyyymmdd(field: &str) -> Option<NaiveDate> {
    let field = field.trim();
    if field.len() != 8 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = field[..4].parse().ok()?;
    let month = field[4..6].parse().ok()?;
    let day = field[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_reads_tab_fields_with_quotes_as_data() {
        let data = "a\tb\"c\t\td\nsecond\trow\n";
        let records: Vec<Record> = TsvRecords::new(data.as_bytes()).collect();
        assert_eq!(records.len(), 2);

        let Record::Fields(first) = &records[0] else {
            panic!("expected fields");
        };
        assert_eq!(first.len(), 4);
        assert_eq!(first.get(1), Some("b\"c"));
        assert_eq!(first.get(2), Some(""));
    }

    #[test]
    fn test_invalid_utf8_is_unreadable_and_reading_continues() {
        let mut data = b"ok\t1\n".to_vec();
        data.extend_from_slice(b"bad\t\xff\xfe\n");
        data.extend_from_slice(b"ok\t2\r\n");

        let records: Vec<Record> = TsvRecords::new(data.as_slice()).collect();
        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], Record::Fields(_)));
        assert!(matches!(records[1], Record::Unreadable));
        let Record::Fields(last) = &records[2] else {
            panic!("expected fields");
        };
        assert_eq!(last.get(1), Some("2"));
    }

    #[test]
    fn test_blank_lines_are_unreadable() {
        let data = "header\n\nfirst\t1\n\r\n\nsecond\t2\n";
        let records: Vec<Record> = TsvRecords::new(data.as_bytes()).collect();
        assert_eq!(records.len(), 6);
        assert!(records[..3].iter().all(|r| matches!(r, Record::Fields(_))));
        assert!(records[3..].iter().all(|r| matches!(r, Record::Unreadable)));

        let clean: Vec<Record> = TsvRecords::new("a\nb".as_bytes()).collect();
        assert_eq!(clean.len(), 2);
        assert!(clean.iter().all(|r| matches!(r, Record::Fields(_))));
    }

    #[rstest]
    #[case("20191231", Some((2019, 12, 31)))]
    #[case("20000229", Some((2000, 2, 29)))]
    #[case("20190229", None)]
    #[case("2019123", None)]
    #[case("2019-12-31", None)]
    #[case("", None)]
    fn test_parse_yyyymmdd(#[case] input: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(parse_yyyymmdd(input), expected);
    }
}
