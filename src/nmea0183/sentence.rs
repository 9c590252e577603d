use tracing::trace;

/// Longest line kept; anything longer is line noise.
pub const MAX_SENTENCE_LENGTH: usize = 256;

/// Accumulates characters from a byte stream and hands out complete lines
/// beginning with `$` or `!`.
#[derive(Debug, Default)]
pub struct SentenceBuffer {
    pending: String,
}

impl SentenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) {
        self.pending.push_str(text);
        if self.pending.len() > MAX_SENTENCE_LENGTH && !self.pending.contains(['\r', '\n']) {
            trace!("Discarding {} buffered characters without a line end", self.pending.len());
            self.pending.clear();
        }
    }

    /// Next complete line, without its terminator. Lines not starting with a
    /// sentence marker, and overlong lines, are skipped.
    pub fn next_sentence(&mut self) -> Option<String> {
        while let Some(end) = self.pending.find(['\r', '\n']) {
            let line: String = self.pending.drain(..=end).collect();
            let line = line.trim_end_matches(['\r', '\n']);
            let Some(start) = line.find(['$', '!']) else {
                continue;
            };
            let line = &line[start..];
            if line.len() > MAX_SENTENCE_LENGTH {
                trace!("Dropping overlong line ({} chars)", line.len());
                continue;
            }
            return Some(line.to_string());
        }
        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// A checksum-validated sentence split into its comma separated fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    /// Two letter talker, e.g. "GP"
    pub talker: String,
    /// Three letter formatter, e.g. "RMC"
    pub kind: String,
    /// `!` sentences carry encapsulated (AIS) payloads
    pub encapsulated: bool,
    fields: Vec<String>,
}

impl Sentence {
    /// Parses one line. The `*hh` checksum is mandatory; anything malformed yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let encapsulated = match line.chars().next()? {
            '$' => false,
            '!' => true,
            _ => return None,
        };
        let (body, checksum) = line[1..].rsplit_once('*')?;
        let expected = u8::from_str_radix(checksum.get(..2)?, 16).ok()?;
        if checksum_of(body) != expected {
            trace!("Checksum mismatch on {}", line);
            return None;
        }

        let mut parts = body.split(',');
        let address = parts.next()?;
        if address.len() != 5 || !address.is_ascii() {
            return None;
        }
        Some(Self {
            talker: address[..2].to_string(),
            kind: address[2..].to_ascii_uppercase(),
            encapsulated,
            fields: parts.map(str::to_string).collect(),
        })
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field `index` (0 is the first after the address), `None` when empty or missing.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields
            .get(index)
            .map(|field| field.trim())
            .filter(|field| !field.is_empty())
    }

    pub fn f64_at(&self, index: usize) -> Option<f64> {
        self.field(index)?.parse::<f64>().ok().filter(|value| value.is_finite())
    }

    pub fn u32_at(&self, index: usize) -> Option<u32> {
        self.field(index)?.parse().ok()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.field(index)?.chars().next().map(|c| c.to_ascii_uppercase())
    }

    /// A `ddmm.mmmm` / `dddmm.mmmm` coordinate followed by its hemisphere letter.
    pub fn coordinate_at(&self, index: usize) -> Option<f64> {
        let raw = self.f64_at(index)?;
        let degrees = (raw / 100.0).trunc();
        let value = degrees + (raw - degrees * 100.0) / 60.0;
        match self.char_at(index + 1)? {
            'N' | 'E' => Some(value),
            'S' | 'W' => Some(-value),
            _ => None,
        }
    }
}

/// XOR of every byte between the start marker and `*`.
pub fn checksum_of(body: &str) -> u8 {
    body.bytes().fold(0, |acc, byte| acc ^ byte)
}

#[cfg(test)]
pub(crate) fn with_checksum(marker: char, body: &str) -> String {
    format!("{}{}*{:02X}", marker, body, checksum_of(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_parse_real_sentence() {
        let sentence = Sentence::parse("$GPGLL,4916.45,N,12311.12,W,225444,A*31").unwrap();
        assert_eq!(sentence.talker, "GP");
        assert_eq!(sentence.kind, "GLL");
        assert!(!sentence.encapsulated);
        assert_abs_diff_eq!(sentence.coordinate_at(0).unwrap(), 49.274166, epsilon = 1e-6);
        assert_abs_diff_eq!(sentence.coordinate_at(2).unwrap(), -123.185333, epsilon = 1e-6);
        assert_eq!(sentence.char_at(5), Some('A'));
    }

    #[test]
    fn test_checksum_required() {
        assert!(Sentence::parse("$GPGLL,4916.45,N,12311.12,W,225444,A").is_none());
        assert!(Sentence::parse("$GPGLL,4916.45,N,12311.12,W,225444,A*32").is_none());
        assert!(Sentence::parse("$GPGLL,4916.45,N,12311.12,W,225444,A*ZZ").is_none());
    }

    #[test]
    fn test_empty_fields() {
        let sentence = Sentence::parse(&with_checksum('$', "SDDPT,,,")).unwrap();
        assert_eq!(sentence.field_count(), 3);
        assert_eq!(sentence.field(0), None);
        assert_eq!(sentence.f64_at(1), None);
        assert_eq!(sentence.f64_at(7), None);
    }

    #[test]
    fn test_buffer_splits_lines() {
        let mut buffer = SentenceBuffer::new();
        buffer.push("garbage\r\n$IIHDT,12");
        assert_eq!(buffer.next_sentence(), None);
        buffer.push("3.4,T*21\r\n!AIVDO,1,1,,,B,0*00\n");
        assert_eq!(buffer.next_sentence().as_deref(), Some("$IIHDT,123.4,T*21"));
        assert_eq!(buffer.next_sentence().as_deref(), Some("!AIVDO,1,1,,,B,0*00"));
        assert_eq!(buffer.next_sentence(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_discards_runaway_input() {
        let mut buffer = SentenceBuffer::new();
        buffer.push(&"$".repeat(MAX_SENTENCE_LENGTH + 1));
        assert!(buffer.is_empty());

        buffer.push(&format!("${}\n$IIHDT,1.0,T*00\n", "A".repeat(MAX_SENTENCE_LENGTH)));
        assert_eq!(buffer.next_sentence().as_deref(), Some("$IIHDT,1.0,T*00"));
    }
}
