//! Element ordering
//!
//! Elements are ordered by visibility rank (private, protected, public) when
//! visibility is in play, then by their literal text. Text comparison is
//! ordinal: `str::cmp` compares UTF-8 bytes, which matches code-point order.
//! Document position never takes part, so the stable sort is what keeps ties
//! in their original order.

use std::cmp::Ordering;

use crate::element::{Element, Visibility};

/// Total order used by the stable sort
pub fn ordering(a: &Element, b: &Element, use_visibility: bool, default: Visibility) -> Ordering {
    if use_visibility {
        let by_rank = a.visibility(default).rank().cmp(&b.visibility(default).rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
    }
    a.sort_key().cmp(b.sort_key())
}

/// Whether `a` sorts strictly before `b`
pub fn compare(a: &Element, b: &Element, use_visibility: bool, default: Visibility) -> bool {
    ordering(a, b, use_visibility, default) == Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Category, LineRange};

    fn prop(line: usize, text: &str, vis: &str) -> Element {
        Element::new(Category::Property, LineRange::new(line, line), text).with_modifiers([vis])
    }

    #[test]
    fn test_visibility_is_primary_key() {
        let protected = prop(1, "protected $z;", "protected");
        let public = prop(2, "public $a;", "public");

        // "protected" > "public" lexically, but protected ranks first
        assert!(compare(&protected, &public, true, Visibility::Public));
        assert!(!compare(&public, &protected, true, Visibility::Public));

        // without visibility only the text counts
        assert!(compare(&protected, &public, false, Visibility::Public));
        assert!(compare(&prop(1, "private $b;", "private"), &protected, false, Visibility::Public));
    }

    #[test]
    fn test_private_before_public() {
        let public = prop(1, "public $b;", "public");
        let private = prop(2, "private $a;", "private");
        assert!(compare(&private, &public, true, Visibility::Public));
    }

    #[test]
    fn test_default_visibility_fallback() {
        let implicit = Element::new(Category::Constant, LineRange::new(1, 1), "const B = 2;");
        let protected = Element::new(Category::Constant, LineRange::new(2, 2), "protected const A = 1;")
            .with_modifiers(["protected"]);

        assert!(compare(&protected, &implicit, true, Visibility::Public));
        assert!(compare(&implicit, &protected, true, Visibility::Private));
    }

    #[test]
    fn test_irreflexive_and_position_independent() {
        let a = prop(1, "public $a;", "public");
        let same_text_later = prop(9, "public $a;", "public");

        assert!(!compare(&a, &a, true, Visibility::Public));
        assert!(!compare(&a, &same_text_later, true, Visibility::Public));
        assert!(!compare(&same_text_later, &a, true, Visibility::Public));
    }

    #[test]
    fn test_ordinal_not_locale() {
        let upper = Element::new(Category::ImportUse, LineRange::new(1, 1), "use Zed;");
        let lower = Element::new(Category::ImportUse, LineRange::new(2, 2), "use apple;");
        // 'Z' (0x5A) < 'a' (0x61)
        assert!(compare(&upper, &lower, false, Visibility::Public));
    }

    #[test]
    fn test_transitive() {
        let a = prop(1, "private $c;", "private");
        let b = prop(2, "protected $a;", "protected");
        let c = prop(3, "public $b;", "public");
        assert!(compare(&a, &b, true, Visibility::Public));
        assert!(compare(&b, &c, true, Visibility::Public));
        assert!(compare(&a, &c, true, Visibility::Public));
    }
}
