use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rust_embed::Embed;
use serde::Serialize;

use crate::exam::{TestDocument, loader};
use crate::scoring::ResultDocument;
use crate::store::schema::DraftData;

/// Sample test documents compiled into the binary, so a fresh install can
/// run `fullmock` with no data directory at all.
#[derive(Embed)]
#[folder = "assets/tests/"]
struct TestAssets;

/// All persistence lives under one data directory:
///
/// ```text
/// <data>/fullmock/tests/<test-id>.json     authored test documents
/// <data>/fullmock/results/<result-id>.json submitted results (write-once)
/// <data>/fullmock/drafts/<test-id>.json    in-progress writing text
/// ```
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fullmock");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn tests_dir(&self) -> PathBuf {
        self.base_dir.join("tests")
    }

    fn results_dir(&self) -> PathBuf {
        self.base_dir.join("results")
    }

    fn drafts_dir(&self) -> PathBuf {
        self.base_dir.join("drafts")
    }

    /// Load a test document by id: the user's data dir first, then the
    /// bundled samples.
    pub fn load_test(&self, test_id: &str) -> Result<TestDocument> {
        let path = self.tests_dir().join(format!("{test_id}.json"));
        let mut doc = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            loader::load_from_str(&content)
                .with_context(|| format!("loading test `{test_id}` from {}", path.display()))?
        } else if let Some(file) = TestAssets::get(&format!("{test_id}.json")) {
            loader::load_from_slice(file.data.as_ref())
                .with_context(|| format!("loading bundled test `{test_id}`"))?
        } else {
            bail!("no test document named `{test_id}` (looked in {})", path.display());
        };
        doc.id = test_id.to_string();
        Ok(doc)
    }

    /// Test ids available from either source, bundled samples last.
    pub fn available_tests(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        if let Ok(entries) = fs::read_dir(self.tests_dir()) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(id) = name.strip_suffix(".json") {
                        ids.push(id.to_string());
                    }
                }
            }
        }
        for file in TestAssets::iter() {
            if let Some(id) = file.strip_suffix(".json") {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        ids
    }

    /// Persist a submitted result. Returns the generated result id; the
    /// document on disk carries it too. Write-once: ids never collide
    /// because a numeric suffix is appended until the name is free.
    pub fn save_result(&self, result: &ResultDocument) -> Result<String> {
        fs::create_dir_all(self.results_dir())?;

        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let base = format!("{}-{stamp}", result.test_id);
        let mut id = base.clone();
        let mut suffix = 1;
        while self.results_dir().join(format!("{id}.json")).exists() {
            suffix += 1;
            id = format!("{base}-{suffix}");
        }

        let mut stamped = result.clone();
        stamped.result_id = id.clone();
        self.save_atomic(self.results_dir().join(format!("{id}.json")), &stamped)?;
        Ok(id)
    }

    pub fn load_result(&self, result_id: &str) -> Result<ResultDocument> {
        let path = self.results_dir().join(format!("{result_id}.json"));
        let content =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_draft(&self, draft: &DraftData) -> Result<()> {
        fs::create_dir_all(self.drafts_dir())?;
        self.save_atomic(
            self.drafts_dir().join(format!("{}.json", draft.test_id)),
            draft,
        )
    }

    /// Restore a draft if one exists and its schema is current.
    pub fn load_draft(&self, test_id: &str) -> Option<DraftData> {
        let path = self.drafts_dir().join(format!("{test_id}.json"));
        let content = fs::read_to_string(path).ok()?;
        let draft: DraftData = serde_json::from_str(&content).ok()?;
        draft.usable().then_some(draft)
    }

    pub fn clear_draft(&self, test_id: &str) {
        let _ = fs::remove_file(self.drafts_dir().join(format!("{test_id}.json")));
    }

    fn save_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<()> {
        let tmp_path = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}
