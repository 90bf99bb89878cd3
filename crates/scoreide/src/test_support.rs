//! Fixture scores for unit tests.

use std::path::{Path, PathBuf};

use crate::classify::{CONTENTS_DIRECTORIES, Roots};
use crate::collaborators::Collaborators;
use crate::config::Configuration;
use crate::controller::Ide;
use crate::metadata::{self, keys};

/// A temporary scores directory holding blue, green and red scores.
///
/// Red has materials `magic_numbers`, `ranges`, `tempi`, segments `_`, `A`,
/// `B` and a `letter` build; green has a year; blue is nearly empty.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub roots: Roots,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("scores");
        std::fs::create_dir(&home).unwrap();

        make_score(&home, "blue_score", "Blue Score", None);
        let green = make_score(&home, "green_score", "Green Score", Some(2018));
        let red = make_score(&home, "red_score", "Red Score", None);
        metadata::set(&red, keys::FORCES_TAGLINE, "for piano").unwrap();

        for material in ["magic_numbers", "ranges", "tempi"] {
            let package = red.join("materials").join(material);
            std::fs::create_dir(&package).unwrap();
            std::fs::write(package.join("definition.py"), "# definition\n").unwrap();
        }
        for (index, segment) in ["_", "A", "B"].iter().enumerate() {
            let package = red.join("segments").join(segment);
            std::fs::create_dir(&package).unwrap();
            std::fs::write(package.join("definition.py"), "# definition\n").unwrap();
            std::fs::write(
                package.join("illustration.ly"),
                format!("\\score {{ c'{} }}\n", index + 1),
            )
            .unwrap();
            metadata::set(&package, keys::MEASURE_COUNT, 4 + index as i64).unwrap();
        }
        let letter = red.join("builds").join("letter");
        std::fs::create_dir_all(letter.join("_segments")).unwrap();
        metadata::set(&letter, keys::PAPER_SIZE, "letter").unwrap();
        std::fs::write(red.parent().unwrap().join("README.md"), "# Red Score\n").unwrap();

        std::fs::create_dir(green.join("segments").join("01")).unwrap();

        Fixture {
            roots: Roots::new(&home),
            dir,
        }
    }

    pub fn home(&self) -> &Path {
        &self.roots.scores
    }

    pub fn red(&self) -> PathBuf {
        self.home().join("red_score").join("red_score")
    }

    pub fn green(&self) -> PathBuf {
        self.home().join("green_score").join("green_score")
    }

    pub fn blue(&self) -> PathBuf {
        self.home().join("blue_score").join("blue_score")
    }

    pub fn configuration(&self) -> Configuration {
        Configuration::default().with_scores_directory(self.home())
    }

    /// A test-mode IDE over inert collaborators.
    pub fn ide(&self) -> Ide {
        Ide::new(self.configuration(), Collaborators::inert(), true).unwrap()
    }

    pub fn ide_with(&self, collaborators: Collaborators, is_test: bool) -> Ide {
        Ide::new(self.configuration(), collaborators, is_test).unwrap()
    }
}

fn make_score(home: &Path, name: &str, title: &str, year: Option<i64>) -> PathBuf {
    let inner = home.join(name).join(name);
    for contents in CONTENTS_DIRECTORIES {
        std::fs::create_dir_all(inner.join(contents)).unwrap();
    }
    metadata::set(&inner, keys::TITLE, title).unwrap();
    if let Some(year) = year {
        metadata::set(&inner, keys::YEAR, year).unwrap();
    }
    inner
}
