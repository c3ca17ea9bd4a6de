use crate::api::{NarrationProvider, status_error};
use crate::error::ProviderError;
use crate::logi;
use crate::request::Language;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;

/// The translate endpoint refuses longer `q` values.
pub const MAX_CHUNK_CHARS: usize = 100;

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?;:,\n।॥]*[.!?;:,\n।॥]*").expect("valid sentence regex"));

/// Free Google translate TTS, the engine behind gTTS.
pub struct GoogleTts {
    client: Client,
    timeout: Duration,
}

impl GoogleTts {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn endpoint(language: Language) -> String {
        format!("https://translate.google.{}/translate_tts", language.tld())
    }
}

#[async_trait]
impl NarrationProvider for GoogleTts {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ProviderError> {
        let chunks = split_for_tts(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ProviderError::UnexpectedBody(
                "nothing to speak after tokenizing".to_string(),
            ));
        }

        let total = chunks.len().to_string();
        let url = Self::endpoint(language);
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx_s = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", language.code()),
                    ("ttsspeed", "1"),
                    ("total", total.as_str()),
                    ("idx", idx_s.as_str()),
                    ("client", "tw-ob"),
                    ("textlen", textlen.as_str()),
                ])
                .header("Referer", "http://translate.google.com/")
                .timeout(self.timeout)
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(status_error(resp).await);
            }
            let bytes = resp.bytes().await?;
            if bytes.is_empty() {
                return Err(ProviderError::UnexpectedBody(format!(
                    "empty audio for chunk {}/{}",
                    idx + 1,
                    chunks.len()
                )));
            }
            audio.extend_from_slice(&bytes);
        }

        logi(format!(
            "TTS ({}) produced {} bytes from {} chunk(s)",
            language,
            audio.len(),
            chunks.len()
        ));
        Ok(audio)
    }
}

/// Splits `text` into pieces of at most `max_chars` characters, preferring
/// sentence punctuation, then whitespace, then a hard cut.
pub fn split_for_tts(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    for sentence in SENTENCE_BREAK.find_iter(text) {
        let sentence = sentence.as_str().trim();
        if sentence.is_empty() {
            continue;
        }
        if sentence.chars().count() <= max_chars {
            pieces.push(sentence.to_string());
            continue;
        }
        for word in sentence.split_whitespace() {
            if word.chars().count() <= max_chars {
                pieces.push(word.to_string());
            } else {
                let chars: Vec<char> = word.chars().collect();
                pieces.extend(chars.chunks(max_chars).map(|c| c.iter().collect()));
            }
        }
    }

    // pack neighbours back together so the request count stays low
    let mut chunks: Vec<String> = Vec::new();
    for piece in pieces {
        match chunks.last_mut() {
            Some(last) if last.chars().count() + 1 + piece.chars().count() <= max_chars => {
                last.push(' ');
                last.push_str(&piece);
            }
            _ => chunks.push(piece),
        }
    }
    chunks.retain(|c| c.chars().any(char::is_alphanumeric));
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(
            split_for_tts("A futuristic city at night", MAX_CHUNK_CHARS),
            vec!["A futuristic city at night".to_string()]
        );
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = "The sun rises over the hills. Birds sing in the trees, and the river runs \
                    quietly past the old mill! Children walk to school while farmers start \
                    their day in the green fields beyond the village.";
        let chunks = split_for_tts(text, 40);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        let rejoined: String = chunks.join(" ");
        assert_eq!(
            rejoined.split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "అందమైన తెలుగు గ్రామం సూర్యోదయం";
        let chunks = split_for_tts(text, MAX_CHUNK_CHARS);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_overlong_word_is_cut() {
        let word = "a".repeat(250);
        let chunks = split_for_tts(&word, MAX_CHUNK_CHARS);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        assert!(split_for_tts("... !!", MAX_CHUNK_CHARS).is_empty());
    }
}
