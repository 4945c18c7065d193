pub trait NormalizeString {
    /// Converts `\r\n` and lone `\r` line endings to `\n` and guarantees a trailing `\n`.
    fn normalize(&self) -> String;
}

impl NormalizeString for str {
    fn normalize(&self) -> String {
        let mut out = self.replace("\r\n", "\n").replace('\r', "\n");
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

impl NormalizeString for String {
    fn normalize(&self) -> String {
        self.as_str().normalize()
    }
}
