//! XML localization file translator
//!
//! Works on text regions rather than a parsed DOM so that whitespace,
//! comments and attribute order in the file survive untouched.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error, info};

use crate::core::client::RetryingTranslator;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{TextUnit, TranslationOutcome, TranslationTarget, KEY_DELIMITER};
use crate::core::progress::ProgressSink;

fn unit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(<[^>]+>)([^<]+)(</[^>]+>)").expect("unit pattern is valid")
    })
}

/// Locate every `<tag>text</tag>` span in order of appearance
///
/// Whitespace between elements and spans opened by a closing tag, comment or
/// declaration are not translatable and are left out.
pub fn extract_units(content: &str) -> Vec<TextUnit> {
    unit_regex()
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let opening = caps.get(1)?.as_str();
            let text = caps.get(2)?.as_str();
            let closing = caps.get(3)?.as_str();

            let markup_only = ["</", "<!", "<?"].iter().any(|p| opening.starts_with(p));
            if markup_only || text.trim().is_empty() {
                return None;
            }

            Some(TextUnit {
                opening_tag: opening.to_string(),
                raw_text: text.to_string(),
                closing_tag: closing.to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Translates a single XML file in place
#[derive(Debug, Clone)]
pub struct XmlFileTranslator {
    translator: RetryingTranslator,
}

impl XmlFileTranslator {
    /// Wrap a retrying translator; every unit of a file goes through it
    pub fn new(translator: RetryingTranslator) -> Self {
        Self { translator }
    }

    /// Translate one file; never fails past this boundary
    ///
    /// `index` is zero-based and only used for progress lines.
    pub async fn translate_file(
        &self,
        target: &TranslationTarget,
        src: &str,
        dest: &str,
        index: usize,
        total: usize,
        sink: &ProgressSink,
    ) -> TranslationOutcome {
        match self.try_translate_file(target, src, dest, index, total, sink).await {
            Ok((content, units)) => {
                info!("Translated {} ({} units)", target, units);
                sink.success(format!("{} translated", target));
                TranslationOutcome::Translated {
                    target: target.clone(),
                    units,
                    content,
                }
            }
            Err(e) => {
                error!("Failed to translate {}: {}", target, e);
                sink.error(format!("Failed to translate file ({}): {}", target, e));
                TranslationOutcome::Failed {
                    target: target.clone(),
                    error: e,
                }
            }
        }
    }

    async fn try_translate_file(
        &self,
        target: &TranslationTarget,
        src: &str,
        dest: &str,
        index: usize,
        total: usize,
        sink: &ProgressSink,
    ) -> Result<(String, usize)> {
        let path = target.path();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TranslationError::file(path, e))?;

        let units = extract_units(&content);
        debug!("{}: {} units", target, units.len());

        let mut translated = String::with_capacity(content.len());
        let mut cursor = 0;

        for (k, unit) in units.iter().enumerate() {
            sink.info(format!(
                "File {}/{} - {} translating unit {}/{}",
                index + 1,
                total,
                target,
                k + 1,
                units.len()
            ));

            let label = format!("{} unit {}", target, k + 1);
            let text = match unit.split_key() {
                Some((key, value)) => {
                    let value = self
                        .translator
                        .translate_unit(value.trim(), src, dest, &label, sink)
                        .await;
                    format!("{}{}{}", key, KEY_DELIMITER, value)
                }
                None => {
                    self.translator
                        .translate_unit(&unit.raw_text, src, dest, &label, sink)
                        .await
                }
            };

            translated.push_str(&content[cursor..unit.span.start]);
            translated.push_str(&unit.render(&text));
            cursor = unit.span.end;
        }
        translated.push_str(&content[cursor..]);

        if translated != content {
            write_replacing(path, &translated).await?;
        } else {
            debug!("{} unchanged, not rewriting", target);
        }

        Ok((translated, units.len()))
    }
}

/// Write to a sibling file and rename it over `path`
async fn write_replacing(path: &Path, content: &str) -> Result<()> {
    let mut file_name = path
        .file_name()
        .ok_or_else(|| TranslationError::file(path, "path has no file name"))?
        .to_os_string();
    file_name.push(".translating");
    let staging: PathBuf = path.with_file_name(file_name);

    if let Err(e) = tokio::fs::write(&staging, content).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(TranslationError::file(path, e));
    }

    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(TranslationError::file(path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::TranslationService;
    use crate::core::progress::{EventLevel, ProgressEvent};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Looks translations up in a fixed table; unknown text is an error
    #[derive(Debug)]
    struct TableService(HashMap<String, String>);

    impl TableService {
        fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl TranslationService for TableService {
        async fn translate(&self, text: &str, _src: &str, _dest: &str) -> Result<String> {
            self.0
                .get(text)
                .cloned()
                .ok_or_else(|| TranslationError::ServiceError {
                    message: format!("no entry for {:?}", text),
                })
        }
    }

    fn file_translator(service: Arc<TableService>) -> XmlFileTranslator {
        XmlFileTranslator::new(RetryingTranslator::new(service, 1, Duration::ZERO))
    }

    async fn translate_str(service: Arc<TableService>, content: &str) -> String {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Test.xml");
        std::fs::write(&path, content).unwrap();

        let outcome = file_translator(service)
            .translate_file(&TranslationTarget::new(&path), "en", "ko", 0, 1, &ProgressSink::disabled())
            .await;
        assert!(outcome.is_success());
        std::fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn test_extract_units() {
        let content = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<LanguageData>\n  <Shirt.label>red shirt</Shirt.label>\n  <!-- note -->\n  <Shirt.description>A [color] shirt.</Shirt.description>\n</LanguageData>\n";
        let units = extract_units(content);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].opening_tag, "<Shirt.label>");
        assert_eq!(units[0].raw_text, "red shirt");
        assert_eq!(units[1].closing_tag, "</Shirt.description>");
        assert_eq!(&content[units[0].span.clone()], "<Shirt.label>red shirt</Shirt.label>");
    }

    #[test]
    fn test_extract_skips_nested_markup() {
        let units = extract_units("<li><b>bold</b> tail</li>");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].raw_text, "bold");
    }

    #[tokio::test]
    async fn test_translates_label_in_place() {
        let service = TableService::new(&[("Red Shirt", "빨간 셔츠")]);
        let out = translate_str(service, "<LanguageData>\n  <label>Red Shirt</label>\n</LanguageData>\n").await;
        assert_eq!(out, "<LanguageData>\n  <label>빨간 셔츠</label>\n</LanguageData>\n");
    }

    #[tokio::test]
    async fn test_duplicate_units_replaced_independently() {
        let service = TableService::new(&[("hello", "안녕")]);
        let out = translate_str(service, "<T>hello</T>\n<T>hello</T>\n").await;
        assert_eq!(out, "<T>안녕</T>\n<T>안녕</T>\n");
    }

    #[tokio::test]
    async fn test_translation_matching_later_unit_does_not_shift_replacements() {
        // first unit translates into the second unit's source text
        let service = TableService::new(&[("one", "two"), ("two", "three")]);
        let out = translate_str(service, "<a>one</a><a>two</a>").await;
        assert_eq!(out, "<a>two</a><a>three</a>");
    }

    #[tokio::test]
    async fn test_key_prefix_kept_verbatim() {
        let service = TableService::new(&[("{} hits {}", "{}이(가) {}을(를) 때림")]);
        let out = translate_str(
            service,
            "<li>r_logentry->  [INITIATOR] hits [RECIPIENT] </li>",
        )
        .await;
        assert_eq!(out, "<li>r_logentry->[INITIATOR]이(가) [RECIPIENT]을(를) 때림</li>");
    }

    #[tokio::test]
    async fn test_failed_unit_keeps_original_text() {
        let service = TableService::new(&[("known", "알려짐")]);
        let out = translate_str(service, "<a>known</a><b>unknown</b>").await;
        assert_eq!(out, "<a>알려짐</a><b>unknown</b>");
    }

    #[tokio::test]
    async fn test_missing_file_is_failed_outcome() {
        let dir = TempDir::new().unwrap();
        let target = TranslationTarget::new(dir.path().join("Missing.xml"));
        let (sink, mut rx) = ProgressSink::channel();

        let outcome = file_translator(TableService::new(&[]))
            .translate_file(&target, "en", "ko", 0, 1, &sink)
            .await;

        assert!(matches!(
            outcome,
            TranslationOutcome::Failed { error: TranslationError::FileError { .. }, .. }
        ));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.level(), Some(EventLevel::Error));
        assert!(event.message().unwrap().contains("Missing.xml"));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_original_and_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.xml");
        std::fs::write(&path, "<a>hi</a>").unwrap();
        std::fs::create_dir(dir.path().join("A.xml.translating")).unwrap();
        let (sink, mut rx) = ProgressSink::channel();

        let outcome = file_translator(TableService::new(&[("hi", "안녕")]))
            .translate_file(&TranslationTarget::new(&path), "en", "ko", 0, 1, &sink)
            .await;

        assert!(matches!(
            outcome,
            TranslationOutcome::Failed { error: TranslationError::FileError { .. }, .. }
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<a>hi</a>");

        let mut errors = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if event.level() == Some(EventLevel::Error) {
                errors.push(event);
            }
        }
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().unwrap().contains("A.xml"));
    }

    #[tokio::test]
    async fn test_progress_events_per_unit_and_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Two.xml");
        std::fs::write(&path, "<a>x</a><b>y</b>").unwrap();
        let (sink, mut rx) = ProgressSink::channel();

        file_translator(TableService::new(&[("x", "엑스"), ("y", "와이")]))
            .translate_file(&TranslationTarget::new(&path), "en", "ko", 2, 5, &sink)
            .await;
        drop(sink);

        let mut events: Vec<ProgressEvent> = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert!(events[0].message().unwrap().starts_with("File 3/5"));
        assert!(events[1].message().unwrap().ends_with("unit 2/2"));
        assert_eq!(events[2].level(), Some(EventLevel::Success));
        assert!(!dir.path().join("Two.xml.translating").exists());
    }
}
