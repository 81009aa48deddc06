use include_dir::{include_dir, Dir};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Deserialize;
use std::error::Error;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/words");

const DEFAULT_VOCABULARY: &str = "ghost";

/// Supplies the next word the player has to type
pub trait WordSource {
    fn next_word(&mut self) -> String;
}

impl<W: WordSource + ?Sized> WordSource for Box<W> {
    fn next_word(&mut self) -> String {
        (**self).next_word()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Vocabulary {
    pub name: String,
    pub words: Vec<String>,
}

impl Vocabulary {
    /// Load one of the vocabularies embedded in the binary
    pub fn load(name: &str) -> Result<Self, Box<dyn Error>> {
        let file = WORDS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| format!("vocabulary {name} not found"))?;
        let text = file
            .contents_utf8()
            .ok_or("vocabulary file is not valid utf-8")?;

        let mut vocab: Vocabulary = serde_json::from_str(text)?;
        vocab.words.retain(|w| !w.trim().is_empty());
        if vocab.words.is_empty() {
            return Err(format!("vocabulary {name} has no words").into());
        }

        Ok(vocab)
    }

    /// The haunted word list shipped with the game
    pub fn builtin() -> Self {
        Self::load(DEFAULT_VOCABULARY).unwrap_or_else(|e| {
            log::error!("falling back to a single word vocabulary: {e}");
            Self {
                name: DEFAULT_VOCABULARY.to_string(),
                words: vec!["ghost".to_string()],
            }
        })
    }
}

/// Uniform random picks from a fixed vocabulary; repeats are allowed
#[derive(Debug)]
pub struct RandomWords {
    vocab: Vocabulary,
    rng: StdRng,
}

impl RandomWords {
    pub fn new(vocab: Vocabulary) -> Self {
        Self {
            vocab,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(vocab: Vocabulary, seed: u64) -> Self {
        Self {
            vocab,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }
}

impl Default for RandomWords {
    fn default() -> Self {
        Self::new(Vocabulary::builtin())
    }
}

impl WordSource for RandomWords {
    fn next_word(&mut self) -> String {
        self.vocab
            .words
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| "ghost".to_string())
    }
}

/// Hands out a caller supplied list in order, wrapping around at the end
#[derive(Debug, Clone)]
pub struct ScriptedWords {
    words: Vec<String>,
    next: usize,
}

impl ScriptedWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .map(Into::into)
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            words = Vocabulary::builtin().words;
        }

        Self { words, next: 0 }
    }
}

impl WordSource for ScriptedWords {
    fn next_word(&mut self) -> String {
        let word = self.words[self.next % self.words.len()].clone();
        self.next = (self.next + 1) % self.words.len();
        word
    }
}
