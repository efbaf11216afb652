use crate::config::OutputEncoding;

/// Convert captured process output to UTF-8.
///
/// When the bytes are not valid in `encoding` the raw capture is returned
/// (lossily, invalid sequences become U+FFFD) instead of being dropped.
pub fn decode_output(bytes: Vec<u8>, encoding: OutputEncoding) -> String {
    match encoding {
        OutputEncoding::Utf8 => String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        OutputEncoding::Gbk => {
            match encoding_rs::GBK.decode_without_bom_handling_and_without_replacement(&bytes) {
                Some(text) => text.into_owned(),
                None => {
                    tracing::debug!(target: "cronx.exec.encoding", len = bytes.len(), "gbk decode failed; returning raw output");
                    String::from_utf8_lossy(&bytes).into_owned()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passthrough() {
        assert_eq!(decode_output("héllo\n".as_bytes().to_vec(), OutputEncoding::Utf8), "héllo\n");
    }

    #[test]
    fn utf8_invalid_bytes_are_kept_lossily() {
        let out = decode_output(b"ok\xff\n".to_vec(), OutputEncoding::Utf8);
        assert!(out.starts_with("ok"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn gbk_is_converted() {
        // "中文" in GBK
        let bytes = vec![0xD6, 0xD0, 0xCE, 0xC4];
        assert_eq!(decode_output(bytes, OutputEncoding::Gbk), "中文");
    }

    #[test]
    fn gbk_failure_falls_back_to_raw() {
        let out = decode_output(b"partial\x81".to_vec(), OutputEncoding::Gbk);
        assert!(out.starts_with("partial"));
    }
}
