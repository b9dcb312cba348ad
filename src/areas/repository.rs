//! Repository: the worktree plus its `.git` metadata directory.
//!
//! Ties the storage areas together: the object database, the staging
//! index, the reference store and the workspace all hang off one
//! repository value. Opening an existing repository validates the
//! metadata layout and the recorded format version; `init` lays the
//! directory structure down.

use crate::areas::config::Config;
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::error::Error;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::Path;

/// Name of the metadata directory.
pub const GIT_DIR: &str = ".git";

/// The only supported repository format version.
const REPOSITORY_FORMAT_VERSION: u32 = 0;

pub struct Repository {
    path: Box<Path>,
    gitdir: Box<Path>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    fn assemble(path: &Path) -> Self {
        let gitdir = path.join(GIT_DIR);

        Repository {
            path: path.into(),
            gitdir: gitdir.clone().into_boxed_path(),
            index: RefCell::new(Index::new(gitdir.join("index").into_boxed_path())),
            database: Database::new(gitdir.join("objects").into_boxed_path()),
            workspace: Workspace::new(path.into()),
            refs: Refs::new(gitdir.into_boxed_path()),
        }
    }

    /// Create a fresh repository at `path`, building the metadata layout.
    ///
    /// Creating over an existing non-empty metadata directory is refused.
    pub fn init(path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("unable to create worktree at {}", path.display()))?;
        let path = path.canonicalize()?;
        let repository = Self::assemble(&path);

        if repository.gitdir.exists() && repository.gitdir.read_dir()?.next().is_some() {
            anyhow::bail!("{} is not empty", repository.gitdir.display());
        }

        for dir in ["objects", "branches", "refs/tags", "refs/heads"] {
            std::fs::create_dir_all(repository.gitdir.join(dir))?;
        }

        std::fs::write(
            repository.gitdir.join("HEAD"),
            "ref: refs/heads/master\n",
        )?;
        std::fs::write(
            repository.gitdir.join("description"),
            "Unnamed repository; edit this file 'description' to name the repository.\n",
        )?;

        let mut config = Config::new();
        config.set(
            "core",
            "repositoryformatversion",
            &REPOSITORY_FORMAT_VERSION.to_string(),
        );
        config.set("core", "filemode", "false");
        config.set("core", "bare", "false");
        config.write_to(&repository.gitdir.join("config"))?;

        tracing::info!(path = %repository.path.display(), "initialized empty repository");

        Ok(repository)
    }

    /// Open the repository whose metadata directory lives at
    /// `path/.git`, validating layout and format version.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let path = path
            .canonicalize()
            .map_err(|_| Error::NotARepository(path.to_path_buf()))?;
        let repository = Self::assemble(&path);

        if !repository.gitdir.is_dir() {
            return Err(Error::NotARepository(path).into());
        }

        let config_path = repository.gitdir.join("config");
        if config_path.exists() {
            let config = Config::load(&config_path)?;
            if let Some(version) = config.get("core", "repositoryformatversion") {
                let version: u32 = version
                    .parse()
                    .map_err(|_| Error::Format(format!("bad format version {version:?}")))?;
                if version != REPOSITORY_FORMAT_VERSION {
                    return Err(Error::Version(version).into());
                }
            }
        }

        Ok(repository)
    }

    /// Walk up from `start` until a directory containing `.git` is found.
    pub fn discover(start: &Path) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .map_err(|_| Error::NotARepository(start.to_path_buf()))?;

        let mut current = Some(start.as_path());
        while let Some(dir) = current {
            if dir.join(GIT_DIR).is_dir() {
                return Self::open(dir);
            }
            current = dir.parent();
        }

        Err(Error::NotARepository(start).into())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    pub fn index(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}
