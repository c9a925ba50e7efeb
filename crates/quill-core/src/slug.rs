//! Slug allocation: turning free-text titles into unique URL-safe identifiers.
//!
//! A slug is lowercase ASCII letters and digits separated by single hyphens.
//! Allocation is a pure function of the title and a snapshot of the slugs
//! already in use; see [`crate::content::ContentStore`] for how the snapshot is
//! taken and how a stale one is recovered from.

use std::collections::HashSet;

use unicode_normalization::{UnicodeNormalization as _, char::is_combining_mark};

/// Used when a title contains nothing sluggable.
pub const FALLBACK_SLUG: &str = "post";

pub const SEPARATOR: char = '-';

/// Normalise `title` into a slug token. May return an empty string.
///
/// Accents are stripped via NFKD decomposition; every run of other
/// characters becomes a single separator, and leading or trailing separators
/// are dropped.
pub fn slugify(title: &str) -> String {
  let mut slug = String::with_capacity(title.len());
  let mut pending_separator = false;

  for ch in title.nfkd() {
    if ch.is_ascii_alphanumeric() {
      if pending_separator && !slug.is_empty() {
        slug.push(SEPARATOR);
      }
      pending_separator = false;
      slug.push(ch.to_ascii_lowercase());
    } else if !is_combining_mark(ch) {
      pending_separator = true;
    }
  }

  slug
}

/// The first candidate for `title`: its slug, or [`FALLBACK_SLUG`].
pub fn base_slug(title: &str) -> String {
  let slug = slugify(title);
  if slug.is_empty() { FALLBACK_SLUG.to_owned() } else { slug }
}

/// `base`, `base-1`, `base-2`, …
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
  std::iter::once(base.to_owned())
    .chain((1u64..).map(move |n| format!("{base}{SEPARATOR}{n}")))
}

/// The first candidate for `base` that `is_taken` rejects.
pub fn first_free(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
  candidates(base)
    .find(|candidate| !is_taken(candidate))
    .unwrap_or_else(|| base.to_owned())
}

/// Allocate a slug for `title` against a snapshot of slugs in use.
///
/// Deterministic: the same title and snapshot always give the same slug.
pub fn allocate(title: &str, existing: &HashSet<String>) -> String {
  let base = base_slug(title);
  first_free(&base, |candidate| existing.contains(candidate))
}

/// Whether `value` has the shape of an allocated slug.
pub fn is_valid_slug(value: &str) -> bool {
  !value.is_empty()
    && !value.starts_with(SEPARATOR)
    && !value.ends_with(SEPARATOR)
    && !value.contains("--")
    && value
      .chars()
      .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == SEPARATOR)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn taken(slugs: &[&str]) -> HashSet<String> {
    slugs.iter().map(|s| (*s).to_owned()).collect()
  }

  #[test]
  fn slugify_lowercases_and_collapses_runs() {
    assert_eq!(slugify("My Title"), "my-title");
    assert_eq!(slugify("  Hello,   World!!  "), "hello-world");
    assert_eq!(slugify("already-a-slug"), "already-a-slug");
    assert_eq!(slugify("a -- b __ c"), "a-b-c");
    assert_eq!(slugify("Top 10 Rust Tips"), "top-10-rust-tips");
  }

  #[test]
  fn slugify_strips_accents() {
    assert_eq!(slugify("Café Déjà Vu"), "cafe-deja-vu");
    assert_eq!(slugify("naïve résumé"), "naive-resume");
  }

  #[test]
  fn slugify_can_be_empty() {
    assert_eq!(slugify(""), "");
    assert_eq!(slugify("!!! ???"), "");
    assert_eq!(slugify("日本語"), "");
  }

  #[test]
  fn base_slug_falls_back_to_post() {
    assert_eq!(base_slug("???"), FALLBACK_SLUG);
    assert_eq!(base_slug("Hello"), "hello");
  }

  #[test]
  fn allocated_slugs_are_always_url_safe() {
    let titles = [
      "My Title",
      "  ",
      "\t\n",
      "emoji 🚀 launch",
      "C'est la vie",
      "tabs\tand\nnewlines",
      "100%",
      "--dashes--",
      "Ünïcödé",
      "/etc/passwd",
    ];
    for title in titles {
      let slug = allocate(title, &HashSet::new());
      assert!(is_valid_slug(&slug), "{title:?} gave {slug:?}");
      assert!(!slug.chars().any(char::is_whitespace));
    }
  }

  #[test]
  fn allocate_without_collision_returns_base() {
    assert_eq!(allocate("My Title", &taken(&["other"])), "my-title");
  }

  #[test]
  fn allocate_appends_first_free_counter() {
    assert_eq!(allocate("My Title", &taken(&["my-title"])), "my-title-1");
    assert_eq!(
      allocate("My Title", &taken(&["my-title", "my-title-1", "my-title-2"])),
      "my-title-3"
    );
  }

  #[test]
  fn allocate_fills_gaps_in_sequence() {
    assert_eq!(allocate("My Title", &taken(&["my-title", "my-title-2"])), "my-title-1");
  }

  #[test]
  fn sequential_allocation_is_distinct_and_ordered() {
    let mut existing = HashSet::new();
    let mut allocated = Vec::new();
    for _ in 0..4 {
      let slug = allocate("Same Title", &existing);
      existing.insert(slug.clone());
      allocated.push(slug);
    }
    assert_eq!(allocated, ["same-title", "same-title-1", "same-title-2", "same-title-3"]);
  }

  #[test]
  fn fallback_slugs_also_get_counters() {
    assert_eq!(allocate("???", &taken(&["post"])), "post-1");
  }

  #[test]
  fn candidates_sequence() {
    let first: Vec<_> = candidates("x").take(3).collect();
    assert_eq!(first, ["x", "x-1", "x-2"]);
  }

  #[test]
  fn valid_slug_shape() {
    assert!(is_valid_slug("my-title-1"));
    assert!(!is_valid_slug(""));
    assert!(!is_valid_slug("-x"));
    assert!(!is_valid_slug("x-"));
    assert!(!is_valid_slug("a--b"));
    assert!(!is_valid_slug("My-Title"));
  }
}
