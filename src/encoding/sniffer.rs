//! Statistical encoding sniffing backed by `chardetng`.

use chardetng::EncodingDetector;

use super::EncodingSniffer;

/// Stop feeding once this many bytes were seen.
const SNIFF_LIMIT: usize = 64 * 1024;

/// [`EncodingSniffer`] using the detector Firefox ships.
pub struct ChardetSniffer {
    detector: EncodingDetector,
    fed: usize,
}

impl ChardetSniffer {
    pub fn new() -> Self {
        Self {
            detector: EncodingDetector::new(),
            fed: 0,
        }
    }
}

impl Default for ChardetSniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingSniffer for ChardetSniffer {
    fn reset(&mut self) {
        self.detector = EncodingDetector::new();
        self.fed = 0;
    }

    fn feed(&mut self, bytes: &[u8]) {
        if self.done() {
            return;
        }
        self.detector.feed(bytes, false);
        self.fed += bytes.len();
    }

    fn done(&self) -> bool {
        self.fed >= SNIFF_LIMIT
    }

    fn result(&self) -> Option<String> {
        if self.fed == 0 {
            return None;
        }
        Some(self.detector.guess(None, true).name().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_fed_has_no_result() {
        assert!(ChardetSniffer::new().result().is_none());
    }

    #[test]
    fn test_utf8_guess() {
        let mut sniffer = ChardetSniffer::new();
        sniffer.feed("grüße aus köln, schöne grüße\n".as_bytes());
        assert_eq!(sniffer.result().as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_reset_forgets_input() {
        let mut sniffer = ChardetSniffer::new();
        sniffer.feed(b"abc\n");
        sniffer.reset();
        assert!(sniffer.result().is_none());
        assert!(!sniffer.done());
    }
}
