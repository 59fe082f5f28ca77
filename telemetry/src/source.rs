use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::api::IngestError;

/// Newline-framed view over the transport byte stream. Lazy and infinite
/// for a live device; never restartable.
pub struct LineSource<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineSource<R> {
    pub fn new(inner: R) -> Self {
        LineSource {
            reader: BufReader::new(inner),
            buf: Vec::with_capacity(128),
        }
    }

    /// Next decoded line, trailing `\r\n` stripped. `Ok(None)` is end of
    /// stream. A `DecodeError` covers that line only; the source stays
    /// usable afterwards. I/O failures surface as `StreamError` and end
    /// the stream.
    pub async fn next_line(&mut self) -> Result<Option<String>, IngestError> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 {
            return Ok(None);
        }
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        match String::from_utf8(std::mem::take(&mut self.buf)) {
            Ok(line) => Ok(Some(line)),
            Err(_) => Err(IngestError::DecodeError(
                "line is not valid utf-8".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_lines_until_end_of_stream() {
        let input: &[u8] = b"first\nsecond\n";
        let mut source = LineSource::new(input);

        assert_eq!(source.next_line().await.unwrap(), Some("first".to_string()));
        assert_eq!(source.next_line().await.unwrap(), Some("second".to_string()));
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn strips_carriage_returns() {
        let input: &[u8] = b"humidity=55.2,temperature=21.4\r\n";
        let mut source = LineSource::new(input);

        assert_eq!(
            source.next_line().await.unwrap(),
            Some("humidity=55.2,temperature=21.4".to_string())
        );
    }

    #[tokio::test]
    async fn yields_a_final_unterminated_line() {
        let input: &[u8] = b"no newline";
        let mut source = LineSource::new(input);

        assert_eq!(
            source.next_line().await.unwrap(),
            Some("no newline".to_string())
        );
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn a_bad_line_does_not_end_the_stream() {
        let input: &[u8] = b"good\n\xff\xfe\nstill good\n";
        let mut source = LineSource::new(input);

        assert_eq!(source.next_line().await.unwrap(), Some("good".to_string()));
        assert!(matches!(
            source.next_line().await,
            Err(IngestError::DecodeError(_))
        ));
        assert_eq!(
            source.next_line().await.unwrap(),
            Some("still good".to_string())
        );
        assert_eq!(source.next_line().await.unwrap(), None);
    }
}
