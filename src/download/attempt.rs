/// Minimum percentage step between two progress notifications.
const PROGRESS_STEP: u8 = 10;

/// State of one download attempt. Created fresh for every retry.
#[derive(Debug)]
pub(crate) struct DownloadAttempt {
    pub number: usize,
    bytes_downloaded: u64,
    total_size: Option<u64>,
    last_reported_percent: u8,
    redirects_left: u32,
}

impl DownloadAttempt {
    pub fn new(number: usize, max_redirects: u32) -> Self {
        Self {
            number,
            bytes_downloaded: 0,
            total_size: None,
            last_reported_percent: 0,
            redirects_left: max_redirects,
        }
    }

    /// Spends one redirect credit; `false` once the budget is exhausted.
    pub fn take_redirect(&mut self) -> bool {
        if self.redirects_left == 0 {
            return false;
        }
        self.redirects_left -= 1;
        true
    }

    /// A zero length is treated like a missing header.
    pub fn start_body(&mut self, total_size: Option<u64>) {
        self.total_size = total_size.filter(|&size| size > 0);
    }

    /// Adds `len` bytes and returns a percentage to report, if one is due.
    pub fn record(&mut self, len: usize) -> Option<u8> {
        self.bytes_downloaded += len as u64;
        let total = self.total_size?;

        let percent = (self.bytes_downloaded.saturating_mul(100) / total).min(100) as u8;
        if percent >= self.last_reported_percent + PROGRESS_STEP {
            self.last_reported_percent = percent;
            Some(percent)
        } else {
            None
        }
    }

    /// Returns 100 unless it was already reported.
    pub fn complete(&mut self) -> Option<u8> {
        if self.last_reported_percent >= 100 {
            return None;
        }
        self.last_reported_percent = 100;
        Some(100)
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }
}
