//! User-facing messages for the end of an install.

use std::path::Path;

use crate::error::InstallError;

pub(crate) fn success_text(path: &Path) -> String {
    format!(
        "Installed successfully! Binary is at: {}\n\n\
         Usage:\n  relaybin run [-- ARGS...]\n  or point your MCP configuration at it:\n  \
         {{ \"command\": \"relaybin\", \"args\": [\"run\"] }}",
        path.display()
    )
}

pub(crate) fn failure_text(
    err: &InstallError,
    url: &str,
    destination: &Path,
    version: &str,
    is_windows: bool,
) -> String {
    let mut text = format!("Installation failed: {}\n\nPossible causes:\n", err);
    text.push_str("  1. Network connectivity problems\n");
    text.push_str("  2. The release has not been published yet\n");
    text.push_str(&format!(
        "  3. No binary exists for version v{} on this platform\n",
        version
    ));
    text.push_str(
        "  4. A proxy is required: set HTTPS_PROXY (or HTTP_PROXY), e.g.\n     \
         export HTTPS_PROXY=http://proxy.example.com:8080\n",
    );

    text.push_str(&format!("\nDownload it manually from:\n  {}\n", url));
    text.push_str(&format!("and save it as:\n  {}\n", destination.display()));
    if !is_windows {
        text.push_str(&format!(
            "then make it executable:\n  chmod 755 {}\n",
            destination.display()
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_text_has_remediation() {
        let text = failure_text(
            &InstallError::UnexpectedStatus(404),
            "https://github.com/o/r/releases/download/v1.0.0/tool-linux-x64",
            Path::new("/opt/bin/tool-linux-x64"),
            "1.0.0",
            false,
        );

        assert!(text.contains("HTTP 404"));
        assert!(text.contains("https://github.com/o/r/releases/download/v1.0.0/tool-linux-x64"));
        assert!(text.contains("/opt/bin/tool-linux-x64"));
        assert!(text.contains("HTTPS_PROXY"));
        assert!(text.contains("v1.0.0"));
        assert!(text.contains("chmod 755 /opt/bin/tool-linux-x64"));
    }

    #[test]
    fn test_failure_text_windows_has_no_chmod() {
        let text = failure_text(
            &InstallError::Timeout(180_000),
            "https://example.com/tool.exe",
            Path::new("C:/bin/tool.exe"),
            "1.0.0",
            true,
        );
        assert!(!text.contains("chmod"));
    }

    #[test]
    fn test_success_text() {
        let text = success_text(Path::new("/opt/bin/tool"));
        assert!(text.contains("/opt/bin/tool"));
        assert!(text.contains("relaybin run"));
    }
}
