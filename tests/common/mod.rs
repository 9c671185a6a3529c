#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env};
use limbic::{Config, Example, LabelSet};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Eight texts per emotion; each emotion has a marker word used nowhere else.
pub const TOY_ROWS: &[(&str, &str)] = &[
    ("i feel sad and lonely tonight", "sadness"),
    ("sad rainy evening without friends", "sadness"),
    ("everything feels sad and grey", "sadness"),
    ("a sad letter arrived this morning", "sadness"),
    ("the sad ending made me cry", "sadness"),
    ("sad songs on repeat all week", "sadness"),
    ("missing home makes me sad", "sadness"),
    ("sad and tired after the funeral", "sadness"),
    ("happy sunny day today", "joy"),
    ("i feel happy about today", "joy"),
    ("today was a happy celebration", "joy"),
    ("happy laughter with friends today", "joy"),
    ("such a happy result today", "joy"),
    ("the kids were happy today", "joy"),
    ("happy news arrived today", "joy"),
    ("a happy party today at work", "joy"),
    ("i love my partner dearly", "love"),
    ("love letters from my sweetheart", "love"),
    ("we love cuddling on the couch", "love"),
    ("my love for her grows", "love"),
    ("love is patient and kind", "love"),
    ("holding hands with my love", "love"),
    ("i love our quiet evenings", "love"),
    ("love you more than words", "love"),
    ("angry about the long delay", "anger"),
    ("angry drivers honking everywhere", "anger"),
    ("he made me angry again", "anger"),
    ("angry at the unfair decision", "anger"),
    ("the angry customer shouted", "anger"),
    ("still angry about the bill", "anger"),
    ("angry words were exchanged", "anger"),
    ("feeling angry and bitter", "anger"),
    ("scared of the dark alley", "fear"),
    ("i feel scared before exams", "fear"),
    ("scared by the loud thunder", "fear"),
    ("the movie left me scared", "fear"),
    ("scared the plane will crash", "fear"),
    ("scared of losing my job", "fear"),
    ("walking home alone scared", "fear"),
    ("scared and shaking all night", "fear"),
    ("surprised by the sudden visit", "surprise"),
    ("i was surprised at the gift", "surprise"),
    ("surprised to see snow in june", "surprise"),
    ("totally surprised by the result", "surprise"),
    ("surprised faces at the reveal", "surprise"),
    ("she looked surprised and amazed", "surprise"),
    ("surprised that it worked", "surprise"),
    ("everyone surprised by the twist", "surprise"),
];

pub fn toy_examples() -> Vec<Example> {
    let labels = LabelSet::emotions();
    TOY_ROWS
        .iter()
        .map(|(text, label)| Example::new(*text, labels.index_of(label).unwrap()))
        .collect()
}

/// Writes `rows` as a `text,label` CSV under `dir`.
pub fn write_csv(dir: &Path, rows: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("emotion_dataset.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(["text", "label"]).unwrap();
    for (text, label) in rows {
        writer.write_record([*text, *label]).unwrap();
    }
    writer.flush().unwrap();
    path
}

pub fn write_toy_csv(dir: &Path) -> PathBuf {
    write_csv(dir, TOY_ROWS)
}

/// Config pointing every path into `dir`.
pub fn test_config(dir: &Path) -> Config {
    Config::default()
        .with_model_dir(dir.join("models"))
        .with_dataset_path(dir.join("emotion_dataset.csv"))
        .with_cache_dir(dir.join("cache"))
}

pub fn model_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
