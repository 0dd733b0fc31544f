use lanegraph::config::{ConfigFile, HistorySection, PaletteSection, RawConfigFile};
use lanegraph::history::{Commit, CommitInfo};
use lanegraph::types::DuplicateBatchBehaviour;

/// Commit with default metadata.
pub fn commit(hash: &str, parents: &[&str]) -> Commit {
    Commit::with_meta(
        hash,
        parents.iter().map(|p| p.to_string()).collect(),
        CommitInfo::default(),
    )
}

/// Builder for an ordered commit stream (children before parents).
#[derive(Debug, Default)]
pub struct HistoryBuilder {
    commits: Vec<Commit>,
}

impl HistoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(mut self, hash: &str, parents: &[&str]) -> Self {
        self.commits.push(commit(hash, parents));
        self
    }

    pub fn authored(mut self, hash: &str, parents: &[&str], author: &str, subject: &str) -> Self {
        let mut c = commit(hash, parents);
        c.meta = CommitInfo {
            author: author.to_string(),
            subject: subject.to_string(),
        };
        self.commits.push(c);
        self
    }

    pub fn build(self) -> Vec<Commit> {
        self.commits
    }

    /// Render as a commit log dump (`%H %P\t%an\t%s`).
    pub fn to_log(&self) -> String {
        let mut out = String::new();
        for c in &self.commits {
            out.push_str(&c.hash);
            for p in &c.parent_hashes {
                out.push(' ');
                out.push_str(p);
            }
            out.push('\t');
            out.push_str(&c.meta.author);
            out.push('\t');
            out.push_str(&c.meta.subject);
            out.push('\n');
        }
        out
    }
}

/// Split `commits` into consecutive batches of `size`.
pub fn batches<M: Clone>(commits: &[Commit<M>], size: usize) -> Vec<Vec<Commit<M>>> {
    commits.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

/// A realistic history in log order.
///
/// ```text
/// m1  merge of feature into main
/// |\
/// c3 |   main
/// |  f2  feature
/// |  f1  feature
/// |/
/// c2
/// c1     root
/// ```
pub fn feature_branch_history() -> HistoryBuilder {
    HistoryBuilder::new()
        .authored("aaaa0006", &["aaaa0005", "bbbb0002"], "alice", "Merge feature")
        .authored("aaaa0005", &["aaaa0004"], "alice", "Tune main")
        .authored("bbbb0002", &["bbbb0001"], "bob", "Feature part two")
        .authored("bbbb0001", &["aaaa0004"], "bob", "Feature part one")
        .authored("aaaa0004", &["aaaa0003"], "alice", "Prepare release")
        .authored("aaaa0003", &[], "alice", "Initial commit")
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                history: HistorySection::default(),
                palette: PaletteSection::default(),
            },
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.history.batch_size = size;
        self
    }

    pub fn max_pending_batches(mut self, n: usize) -> Self {
        self.config.history.max_pending_batches = n;
        self
    }

    pub fn duplicate_behaviour(mut self, behaviour: DuplicateBatchBehaviour) -> Self {
        self.config.history.duplicate_batch_behaviour = behaviour;
        self
    }

    pub fn palette(mut self, colors: &[&str]) -> Self {
        self.config.palette.colors = colors.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
