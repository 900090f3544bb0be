use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum XttsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("Invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid WAV audio: {0}")]
    Wav(#[from] hound::Error),
    #[error("Language '{language}' is not supported by {model} (available: {available})")]
    UnsupportedLanguage {
        language: String,
        model: String,
        available: String,
    },
    #[error("Reference sample not found: {0}")]
    ReferenceNotFound(String),
    #[error("Text to synthesize is empty")]
    EmptyText,
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
}

#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    model_name: &'a str,
    device: &'a str,
}

/// Server answer to a successful `/load`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadedModel {
    pub model_name: String,
    pub device: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Conditioning latents the server computes from a reference recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerLatents {
    pub gpt_cond_latent: Vec<Vec<f32>>,
    pub speaker_embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    language: &'a str,
    speaker_embedding: &'a [f32],
    gpt_cond_latent: &'a [Vec<f32>],
}

/// Thin blocking client for the XTTS inference server.
///
/// `/load` is never cut off: fetching the model on first start can take as
/// long as the download. `request_timeout`, when set, bounds `/clone_speaker`
/// and `/tts` only.
pub struct XttsClient {
    http: Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl XttsClient {
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> Result<Self, XttsError> {
        // The blocking client defaults to a 30 s timeout; lift it.
        let http = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    fn bounded(&self, request: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the server to load `model_name` onto `device`.
    pub fn load(&self, model_name: &str, device: &str) -> Result<LoadedModel, XttsError> {
        let response = self
            .http
            .post(self.url("/load"))
            .json(&LoadRequest { model_name, device })
            .send()?;
        Ok(check_status(response)?.json()?)
    }

    /// Upload a reference recording and get its conditioning latents back.
    pub fn clone_speaker(&self, reference: &Path) -> Result<SpeakerLatents, XttsError> {
        let form = multipart::Form::new().file("wav_file", reference)?;
        let response = self
            .bounded(self.http.post(self.url("/clone_speaker")))
            .multipart(form)
            .send()?;
        Ok(check_status(response)?.json()?)
    }

    /// Synthesize `text` with the given latents, returning raw WAV bytes.
    pub fn tts(
        &self,
        text: &str,
        language: &str,
        latents: &SpeakerLatents,
    ) -> Result<Vec<u8>, XttsError> {
        let request = TtsRequest {
            text,
            language,
            speaker_embedding: &latents.speaker_embedding,
            gpt_cond_latent: &latents.gpt_cond_latent,
        };
        let response = self
            .bounded(self.http.post(self.url("/tts")))
            .json(&request)
            .send()?;
        let encoded: String = check_status(response)?.json()?;
        decode_base64_audio(&encoded)
    }
}

fn check_status(response: Response) -> Result<Response, XttsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(XttsError::Server {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

/// Check that the loaded model can speak `language`.
///
/// An empty language list means the server did not report one; nothing is
/// checked in that case.
pub fn ensure_language(loaded: &LoadedModel, language: &str) -> Result<(), XttsError> {
    if loaded.languages.is_empty() || loaded.languages.iter().any(|l| l == language) {
        return Ok(());
    }
    Err(XttsError::UnsupportedLanguage {
        language: language.to_string(),
        model: loaded.model_name.clone(),
        available: loaded.languages.join(", "),
    })
}

/// Decode the base64 WAV payload returned by `/tts`.
///
/// Some servers wrap the payload in quotes a second time; those are stripped.
pub fn decode_base64_audio(encoded: &str) -> Result<Vec<u8>, XttsError> {
    let trimmed = encoded.trim().trim_matches('"');
    Ok(STANDARD.decode(trimmed)?)
}

/// Read WAV bytes into mono f32 samples.
///
/// Multi-channel audio is downmixed by averaging channels.
pub fn wav_to_samples(bytes: &[u8]) -> Result<(Vec<f32>, u32), XttsError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }
    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Instant;

    /// Serve one HTTP request on a local port, answering `body` as JSON after
    /// `delay`. Returns the base URL.
    fn serve_once(delay: Duration, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            read_request(&stream);
            thread::sleep(delay);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            // The client may already have given up.
            let _ = (&stream).write_all(response.as_bytes());
        });
        url
    }

    fn read_request(stream: &TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
    }

    fn wav_bytes(
        spec: hound::WavSpec,
        write: impl FnOnce(&mut hound::WavWriter<&mut Cursor<Vec<u8>>>),
    ) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn loaded(languages: &[&str]) -> LoadedModel {
        LoadedModel {
            model_name: "xtts_v2".to_string(),
            device: "cpu".to_string(),
            languages: languages.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn accepts_listed_language() {
        assert!(ensure_language(&loaded(&["en", "de", "fr"]), "de").is_ok());
    }

    #[test]
    fn rejects_unlisted_language() {
        let err = ensure_language(&loaded(&["en", "de"]), "tlh").unwrap_err();
        match err {
            XttsError::UnsupportedLanguage { language, available, .. } => {
                assert_eq!(language, "tlh");
                assert_eq!(available, "en, de");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_language_list_is_not_checked() {
        assert!(ensure_language(&loaded(&[]), "en").is_ok());
    }

    #[test]
    fn decodes_quoted_base64_payload() {
        let encoded = format!("\"{}\"", STANDARD.encode(b"RIFF"));
        assert_eq!(decode_base64_audio(&encoded).unwrap(), b"RIFF".to_vec());
    }

    #[test]
    fn rejects_garbage_base64() {
        assert!(matches!(
            decode_base64_audio("not base64!!"),
            Err(XttsError::Base64(_))
        ));
    }

    #[test]
    fn reads_16_bit_pcm() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |w| {
            w.write_sample(0i16).unwrap();
            w.write_sample(16384i16).unwrap();
            w.write_sample(-32768i16).unwrap();
        });

        let (samples, rate) = wav_to_samples(&bytes).unwrap();
        assert_eq!(rate, 24000);
        assert_eq!(samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn downmixes_stereo_float() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |w| {
            w.write_sample(0.5f32).unwrap();
            w.write_sample(0.25f32).unwrap();
            w.write_sample(-1.0f32).unwrap();
            w.write_sample(1.0f32).unwrap();
        });

        let (samples, rate) = wav_to_samples(&bytes).unwrap();
        assert_eq!(rate, 22050);
        assert_eq!(samples, vec![0.375, 0.0]);
    }

    #[test]
    fn serializes_tts_request_fields() {
        let latents = SpeakerLatents {
            gpt_cond_latent: vec![vec![0.5, 1.0]],
            speaker_embedding: vec![0.25],
        };
        let request = TtsRequest {
            text: "hi",
            language: "en",
            speaker_embedding: &latents.speaker_embedding,
            gpt_cond_latent: &latents.gpt_cond_latent,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "hi");
        assert_eq!(json["language"], "en");
        assert_eq!(json["speaker_embedding"], serde_json::json!([0.25]));
        assert_eq!(json["gpt_cond_latent"], serde_json::json!([[0.5, 1.0]]));
    }

    #[test]
    fn load_outlasts_the_request_timeout() {
        let url = serve_once(
            Duration::from_millis(800),
            r#"{"model_name":"xtts_v2","device":"cpu","languages":["en"]}"#,
        );
        let client = XttsClient::new(&url, Some(Duration::from_millis(200))).unwrap();

        let loaded = client.load("xtts_v2", "cpu").unwrap();

        assert_eq!(loaded.model_name, "xtts_v2");
        assert_eq!(loaded.languages, vec!["en".to_string()]);
    }

    #[test]
    fn clone_speaker_honours_the_request_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("alice.wav");
        std::fs::write(&reference, b"RIFF").unwrap();
        let url = serve_once(Duration::from_secs(3), "{}");
        let client = XttsClient::new(&url, Some(Duration::from_millis(200))).unwrap();

        let start = Instant::now();
        let err = client.clone_speaker(&reference).unwrap_err();

        assert!(matches!(err, XttsError::Http(_)));
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
