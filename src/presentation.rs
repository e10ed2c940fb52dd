/*!
# Presentations

A presentation is an alphabet of generator letters together with a finite list of
defining relations `u = v`. Letters are plain integers; words are [`Word`]s over the
alphabet. Rules are stored as a flat list of words in which consecutive pairs form the
relations, and the order of rules is observable: the completion engine iterates them in
the order they were added.

Two kinds are supported:

- [`Presentation`]: a semigroup presentation, or a monoid presentation when the empty
  word is admitted.
- [`InversePresentation`]: extends a presentation over `n` generators with a formal
  inverse for every generator. The label range doubles to `2n` and label `a + n` is the
  inverse of `a`; the resulting pairing is a fixed-point-free involution on the doubled
  alphabet.

Validation is explicit: [`Presentation::validate`] rechecks all invariants, and
[`Presentation::add_rule_checked`] validates a single rule on insertion. The completion
engine only accepts presentations whose letters are usable as edge labels, i.e. within
`[0, alphabet_size)`.
*/

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::{
    error::{Error, Result},
    node::{Letter, NumLetters, Word},
};

/// An alphabet together with a flat list of relation words.
///
/// # Examples
/// ```
/// use wgraphs::presentation::Presentation;
///
/// let mut p = Presentation::new();
/// p.set_alphabet_size(2);
/// p.add_rule_checked(&[0, 0], &[0]).unwrap();
/// assert_eq!(p.number_of_rules(), 1);
/// assert!(p.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    alphabet: Word,
    index: FxHashMap<Letter, NumLetters>,
    rules: Vec<Word>,
    contains_empty_word: bool,
}

impl Presentation {
    /// Creates an empty presentation with no letters and no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alphabet to the letters `0..n`.
    pub fn set_alphabet_size(&mut self, n: NumLetters) {
        self.alphabet = (0..n).collect();
        self.index = self.alphabet.iter().map(|&l| (l, l)).collect();
    }

    /// Sets the alphabet to an explicit list of letters.
    ///
    /// Fails with [`Error::DuplicateLetter`] if a letter occurs twice.
    pub fn set_alphabet(&mut self, letters: &[Letter]) -> Result<()> {
        let mut index = FxHashMap::default();
        for (i, &l) in letters.iter().enumerate() {
            if index.insert(l, i as NumLetters).is_some() {
                return Err(Error::DuplicateLetter { letter: l });
            }
        }
        self.alphabet = letters.to_vec();
        self.index = index;
        Ok(())
    }

    /// Returns the alphabet.
    #[inline]
    pub fn alphabet(&self) -> &[Letter] {
        &self.alphabet
    }

    /// Returns the number of letters in the alphabet.
    #[inline]
    pub fn alphabet_size(&self) -> NumLetters {
        self.alphabet.len() as NumLetters
    }

    /// Returns the letter at position `i` of the alphabet.
    ///
    /// **Panics if `i >= alphabet_size()`.**
    #[inline]
    pub fn letter(&self, i: NumLetters) -> Letter {
        self.alphabet[i as usize]
    }

    /// Returns the position of `l` in the alphabet, if present.
    #[inline]
    pub fn index_of(&self, l: Letter) -> Option<NumLetters> {
        self.index.get(&l).copied()
    }

    /// Returns *true* if `l` belongs to the alphabet.
    #[inline]
    pub fn in_alphabet(&self, l: Letter) -> bool {
        self.index.contains_key(&l)
    }

    /// Returns *true* if the empty word is admitted, i.e. this is a monoid presentation.
    #[inline]
    pub fn contains_empty_word(&self) -> bool {
        self.contains_empty_word
    }

    /// Declares whether the empty word is admitted.
    pub fn set_contains_empty_word(&mut self, yes: bool) {
        self.contains_empty_word = yes;
    }

    /// Builder-style variant of [`Self::set_contains_empty_word`].
    pub fn with_empty_word(mut self, yes: bool) -> Self {
        self.set_contains_empty_word(yes);
        self
    }

    /// Appends the rule `u = v` without any checks.
    pub fn add_rule(&mut self, u: &[Letter], v: &[Letter]) {
        self.rules.push(u.to_vec());
        self.rules.push(v.to_vec());
    }

    /// Appends the rule `u = v` after validating both sides.
    ///
    /// Fails with [`Error::LetterOutOfBounds`] if a letter is not in the alphabet, and
    /// with [`Error::EmptyRuleSide`] if a side is empty while the empty word is not
    /// admitted.
    pub fn add_rule_checked(&mut self, u: &[Letter], v: &[Letter]) -> Result<()> {
        self.validate_word(u)?;
        self.validate_word(v)?;
        if !self.contains_empty_word && (u.is_empty() || v.is_empty()) {
            return Err(Error::EmptyRuleSide {
                rule: self.number_of_rules(),
            });
        }
        self.add_rule(u, v);
        Ok(())
    }

    /// Returns the number of rules.
    #[inline]
    pub fn number_of_rules(&self) -> usize {
        self.rules.len() / 2
    }

    /// Returns the two sides of rule `i`.
    ///
    /// **Panics if `i >= number_of_rules()`.**
    #[inline]
    pub fn rule(&self, i: usize) -> (&[Letter], &[Letter]) {
        (&self.rules[2 * i], &self.rules[2 * i + 1])
    }

    /// Iterates over all rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (&[Letter], &[Letter])> {
        self.rules.chunks_exact(2).map(|r| (&*r[0], &*r[1]))
    }

    /// Checks that every letter of `w` belongs to the alphabet.
    pub fn validate_word(&self, w: &[Letter]) -> Result<()> {
        match w.iter().find(|&&l| !self.in_alphabet(l)) {
            None => Ok(()),
            Some(&l) => Err(Error::LetterOutOfBounds {
                letter: l,
                alphabet_size: self.alphabet_size(),
            }),
        }
    }

    /// Rechecks all invariants: unique alphabet letters, rule letters in the alphabet,
    /// and no empty rule side unless the empty word is admitted.
    pub fn validate(&self) -> Result<()> {
        if !self.alphabet.iter().all_unique() {
            let letter = self
                .alphabet
                .iter()
                .duplicates()
                .next()
                .copied()
                .expect("a duplicate exists");
            return Err(Error::DuplicateLetter { letter });
        }

        for (i, (u, v)) in self.rules().enumerate() {
            self.validate_word(u)?;
            self.validate_word(v)?;
            if !self.contains_empty_word && (u.is_empty() || v.is_empty()) {
                return Err(Error::EmptyRuleSide { rule: i });
            }
        }
        Ok(())
    }
}

/// A presentation extended with formal inverses.
///
/// Built from a presentation over `n` generators whose letters are exactly `0..n`; the
/// label range doubles to `2n`, and [`InversePresentation::inverse_of`] realises the
/// involution `l <-> l + n`. Rules and input words may use the full doubled range, so
/// `[a, a + n]` spells "`a` times the inverse of `a`".
///
/// # Examples
/// ```
/// use wgraphs::presentation::{InversePresentation, Presentation};
///
/// let mut p = Presentation::new().with_empty_word(true);
/// p.set_alphabet_size(3);
/// p.add_rule(&[0, 1, 2], &[]);
/// let ip = InversePresentation::new(p).unwrap();
///
/// assert_eq!(ip.number_of_generators(), 3);
/// assert_eq!(ip.presentation().alphabet_size(), 6);
/// assert_eq!(ip.inverse_of(2), 5);
/// assert_eq!(ip.inverse_of(5), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InversePresentation {
    pres: Presentation,
    num_generators: NumLetters,
}

impl InversePresentation {
    /// Extends `p` with a formal inverse per generator.
    ///
    /// Fails if `p`'s alphabet is not exactly `0..n`, or if a rule of `p` is invalid
    /// over the doubled alphabet.
    pub fn new(p: Presentation) -> Result<Self> {
        let n = p.alphabet_size();
        if let Some(&l) = p.alphabet().iter().find(|&&l| l >= n) {
            return Err(Error::LetterOutOfBounds {
                letter: l,
                alphabet_size: n,
            });
        }
        let mut pres = p;
        pres.set_alphabet_size(2 * n);
        pres.validate()?;

        Ok(Self {
            pres,
            num_generators: n,
        })
    }

    /// Returns the underlying presentation over the doubled alphabet.
    #[inline]
    pub fn presentation(&self) -> &Presentation {
        &self.pres
    }

    /// Returns the number of generators (half the doubled alphabet).
    #[inline]
    pub fn number_of_generators(&self) -> NumLetters {
        self.num_generators
    }

    /// Returns the formal inverse of a label in the doubled range.
    ///
    /// **Panics if `l >= 2 * number_of_generators()`.**
    #[inline]
    pub fn inverse_of(&self, l: Letter) -> Letter {
        assert!(l < 2 * self.num_generators);
        (l + self.num_generators) % (2 * self.num_generators)
    }

    /// Rechecks the invariants of the underlying presentation and that the pairing is a
    /// fixed-point-free involution.
    pub fn validate(&self) -> Result<()> {
        self.pres.validate()?;
        debug_assert!(
            (0..2 * self.num_generators)
                .all(|l| self.inverse_of(self.inverse_of(l)) == l && self.inverse_of(l) != l)
        );
        Ok(())
    }
}

/// The presentation kind a [`Stephen`](crate::stephen::Stephen) engine runs on: a tagged
/// value selecting the out-degree of the word graph and whether the involution
/// discipline applies during edge definition and merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyPresentation {
    Plain(Presentation),
    Inverse(InversePresentation),
}

impl From<Presentation> for AnyPresentation {
    fn from(p: Presentation) -> Self {
        Self::Plain(p)
    }
}

impl From<InversePresentation> for AnyPresentation {
    fn from(p: InversePresentation) -> Self {
        Self::Inverse(p)
    }
}

impl AnyPresentation {
    /// Returns the underlying presentation (over the doubled alphabet in the inverse
    /// case).
    #[inline]
    pub fn base(&self) -> &Presentation {
        match self {
            Self::Plain(p) => p,
            Self::Inverse(ip) => ip.presentation(),
        }
    }

    /// Returns the out-degree of the word graph: the alphabet size, doubled for an
    /// inverse presentation.
    #[inline]
    pub fn label_count(&self) -> NumLetters {
        self.base().alphabet_size()
    }

    /// Returns the formal inverse of `l`, or `None` for a plain presentation.
    #[inline]
    pub fn inverse_of(&self, l: Letter) -> Option<Letter> {
        match self {
            Self::Plain(_) => None,
            Self::Inverse(ip) => Some(ip.inverse_of(l)),
        }
    }

    /// Returns *true* for an inverse presentation.
    #[inline]
    pub fn is_inverse(&self) -> bool {
        matches!(self, Self::Inverse(_))
    }

    /// Rechecks all invariants of the underlying presentation.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Plain(p) => p.validate(),
            Self::Inverse(ip) => ip.validate(),
        }
    }
}
