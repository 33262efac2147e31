//! Timed SRT construction.
//!
//! Three strategies, picked per job by what timing data survived ASR:
//! word-grouped cues when word-level timing exists, one cue per segment when
//! only segment timing exists, and a proportional layout over plain text as
//! the last resort. Cue arithmetic is integer milliseconds throughout so
//! float drift never accumulates across cues.

use crate::domain::transcript::{Transcript, Word};

/// Bounds applied simultaneously while grouping words into cues.
#[derive(Clone, Copy, Debug)]
pub struct SrtLimits {
    pub max_words: usize,
    pub max_line_duration: f64,
    pub max_chars: usize,
}

impl Default for SrtLimits {
    fn default() -> Self {
        Self {
            max_words: 7,
            max_line_duration: 4.0,
            max_chars: 80,
        }
    }
}

/// One SRT entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Pick the best strategy for this transcript and render the cues.
/// `fallback_text` and `total_seconds` parametrize the proportional layout
/// used when the transcript carries no timing at all.
pub fn build(
    transcript: &Transcript,
    fallback_text: &str,
    total_seconds: f64,
    limits: &SrtLimits,
) -> Vec<Cue> {
    if transcript.has_words() {
        let words: Vec<Word> = transcript.words().into_iter().cloned().collect();
        from_words(&words, limits)
    } else if !transcript.segments.is_empty() {
        from_segments(transcript)
    } else {
        proportional(fallback_text, total_seconds)
    }
}

/// Greedy word grouping. A cue closes when adding the next word would break
/// any bound, but never before it holds at least one word, so a single
/// oversized word still gets its own cue.
pub fn from_words(words: &[Word], limits: &SrtLimits) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let start = words[i].start;
        let mut end = words[i].end;
        let mut chars = 0usize;
        let mut parts: Vec<&str> = Vec::new();

        for word in &words[i..] {
            let added = word.word.chars().count() + 1;
            let would_break = (word.end - start) > limits.max_line_duration
                || chars + added > limits.max_chars
                || parts.len() >= limits.max_words;
            if would_break && !parts.is_empty() {
                break;
            }
            parts.push(&word.word);
            chars += added;
            end = word.end;
        }

        let text = parts.join(" ");
        i += parts.len();
        cues.push(Cue {
            start_ms: to_ms(start),
            end_ms: to_ms(end),
            text,
        });
    }

    cues
}

/// One cue per canonical segment, using the segment's own timing.
pub fn from_segments(transcript: &Transcript) -> Vec<Cue> {
    transcript
        .segments
        .iter()
        .map(|seg| Cue {
            start_ms: to_ms(seg.start),
            end_ms: to_ms(seg.end),
            text: seg.text.clone(),
        })
        .collect()
}

/// No timing at all: split into sentences and give each a share of
/// `total_seconds` proportional to its character count, laid end-to-end
/// from zero.
pub fn proportional(text: &str, total_seconds: f64) -> Vec<Cue> {
    let sentences = split_sentences(text);
    let total_chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
    if total_chars == 0 {
        return Vec::new();
    }

    let mut cues = Vec::with_capacity(sentences.len());
    let mut consumed = 0usize;
    for sentence in sentences {
        let start = total_seconds * consumed as f64 / total_chars as f64;
        consumed += sentence.chars().count();
        let end = total_seconds * consumed as f64 / total_chars as f64;
        cues.push(Cue {
            start_ms: to_ms(start),
            end_ms: to_ms(end),
            text: sentence,
        });
    }
    cues
}

/// Split on sentence terminators `.!?` followed by whitespace, keeping the
/// terminator with its sentence. Empty pieces are dropped.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Render cues as an SRT document: 1-based index, timing line, text, blank
/// separator. LF line endings.
pub fn render(cues: &[Cue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start_ms),
            format_timestamp(cue.end_ms),
            cue.text
        ));
    }
    out
}

/// Seconds to integer milliseconds with per-component floor truncation.
fn to_ms(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    let whole = seconds.floor();
    whole as u64 * 1000 + ((seconds - whole) * 1000.0).floor() as u64
}

fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transcript::Segment;

    fn words(spec: &[(&str, f64, f64)]) -> Vec<Word> {
        spec.iter()
            .map(|(w, s, e)| Word {
                word: w.to_string(),
                start: *s,
                end: *e,
            })
            .collect()
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(0), "00:00:00,000");
        assert_eq!(format_timestamp(3_661_042), "01:01:01,042");
        assert_eq!(to_ms(1.5), 1500);
        assert_eq!(to_ms(2.0009), 2000);
        assert_eq!(to_ms(-3.0), 0);
    }

    #[test]
    fn test_word_grouping_respects_all_bounds() {
        // 20 words, 0.5 s each, spanning 10 s
        let ws: Vec<Word> = (0..20)
            .map(|i| Word {
                word: format!("word{:02}", i),
                start: i as f64 * 0.5,
                end: i as f64 * 0.5 + 0.5,
            })
            .collect();
        let limits = SrtLimits::default();
        let cues = from_words(&ws, &limits);

        let mut covered = 0;
        let mut prev_end = 0;
        for cue in &cues {
            let count = cue.text.split_whitespace().count();
            assert!(count <= limits.max_words);
            assert!(cue.end_ms - cue.start_ms <= (limits.max_line_duration * 1000.0) as u64);
            assert!(cue.text.chars().count() <= limits.max_chars);
            // non-overlapping, non-decreasing
            assert!(cue.start_ms >= prev_end);
            prev_end = cue.end_ms;
            covered += count;
        }
        assert_eq!(covered, 20);
        // order is preserved
        assert!(cues[0].text.starts_with("word00"));
        assert!(cues.last().unwrap().text.ends_with("word19"));
    }

    #[test]
    fn test_duration_bound_closes_cue() {
        let ws = words(&[("a", 0.0, 3.9), ("b", 3.9, 4.5), ("c", 4.5, 5.0)]);
        let cues = from_words(&ws, &SrtLimits::default());
        // "b" would stretch the first cue past 4.0 s
        assert_eq!(cues[0].text, "a");
        assert_eq!(cues[1].text, "b c");
    }

    #[test]
    fn test_oversized_single_word_forms_own_cue() {
        let long = "x".repeat(200);
        let ws = words(&[(&long, 0.0, 10.0), ("ok", 10.0, 10.5)]);
        let cues = from_words(&ws, &SrtLimits::default());
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, long);
        assert_eq!(cues[0].end_ms, 10_000);
        assert_eq!(cues[1].text, "ok");
    }

    #[test]
    fn test_char_bound_counts_word_plus_space() {
        let limits = SrtLimits {
            max_words: 100,
            max_line_duration: 100.0,
            max_chars: 10,
        };
        // "abcd" costs 5 per word; two fit in 10, the third does not
        let ws = words(&[
            ("abcd", 0.0, 0.1),
            ("efgh", 0.1, 0.2),
            ("ijkl", 0.2, 0.3),
        ]);
        let cues = from_words(&ws, &limits);
        assert_eq!(cues[0].text, "abcd efgh");
        assert_eq!(cues[1].text, "ijkl");
    }

    #[test]
    fn test_segment_cues() {
        let transcript = Transcript {
            text: "one two".into(),
            segments: vec![
                Segment {
                    text: "one".into(),
                    start: 0.0,
                    end: 1.0,
                    words: None,
                },
                Segment {
                    text: "two".into(),
                    start: 1.0,
                    end: 2.5,
                    words: None,
                },
            ],
        };
        let cues = from_segments(&transcript);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].start_ms, 1000);
        assert_eq!(cues[1].end_ms, 2500);
    }

    #[test]
    fn test_proportional_shares() {
        let cues = proportional("Short one. A somewhat longer sentence here!", 10.0);
        assert_eq!(cues.len(), 2);
        let d0 = cues[0].end_ms - cues[0].start_ms;
        let d1 = cues[1].end_ms - cues[1].start_ms;
        let l0 = cues[0].text.chars().count() as f64;
        let l1 = cues[1].text.chars().count() as f64;
        // durations proportional to character counts, summing to the total
        assert!((d0 as f64 / d1 as f64 - l0 / l1).abs() < 0.01);
        assert!((cues.last().unwrap().end_ms as i64 - 10_000).abs() <= 2);
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, cues[1].start_ms);
    }

    #[test]
    fn test_proportional_empty_text() {
        assert!(proportional("", 10.0).is_empty());
        assert!(proportional("   ", 10.0).is_empty());
    }

    #[test]
    fn test_sentence_split_keeps_terminators() {
        let parts = split_sentences("Hello there. How are you? Fine! Trailing");
        assert_eq!(
            parts,
            vec!["Hello there.", "How are you?", "Fine!", "Trailing"]
        );
        // a period not followed by whitespace does not split
        let parts = split_sentences("v1.2 is out. Yes");
        assert_eq!(parts, vec!["v1.2 is out.", "Yes"]);
    }

    #[test]
    fn test_render_srt_document() {
        let cues = vec![
            Cue {
                start_ms: 0,
                end_ms: 1500,
                text: "hello".into(),
            },
            Cue {
                start_ms: 1500,
                end_ms: 3000,
                text: "world".into(),
            },
        ];
        let srt = render(&cues);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,500\nhello\n\n2\n00:00:01,500 --> 00:00:03,000\nworld\n\n"
        );
    }

    #[test]
    fn test_build_prefers_words_then_segments_then_proportional() {
        let with_words = Transcript {
            text: "hi".into(),
            segments: vec![Segment {
                text: "hi".into(),
                start: 0.0,
                end: 0.5,
                words: Some(vec![Word {
                    word: "hi".into(),
                    start: 0.0,
                    end: 0.5,
                }]),
            }],
        };
        let limits = SrtLimits::default();
        assert_eq!(build(&with_words, "ignored", 60.0, &limits).len(), 1);

        let with_segments = Transcript {
            text: "hi".into(),
            segments: vec![Segment {
                text: "hi".into(),
                start: 0.0,
                end: 0.5,
                words: None,
            }],
        };
        let cues = build(&with_segments, "ignored", 60.0, &limits);
        assert_eq!(cues[0].end_ms, 500);

        let bare = Transcript::from_text("Only text here.");
        let cues = build(&bare, "Only text here.", 5.0, &limits);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].end_ms, 5000);
    }
}
