//! Autoformat pattern detection.
//!
//! On every "about to insert character" event the engine looks at the
//! *whole* trimmed text of the caret block. When the incoming character is
//! a space and that text exactly equals a trigger marker, the marker is
//! consumed and replaced by a formatting action. Matching the whole block
//! (not a suffix) keeps the rules unambiguous without a real parser: a
//! literal `**` somewhere inside longer text never fires.

use crate::editing::{
    commands::{ChangeLabel, Edit},
    document::{BlockKind, Document, InlineStyle},
    selection::Selection,
    EditError,
};

/// A recognized trigger: the edit consuming the marker text, plus the
/// caret style the session should flip (`None` for block-kind triggers,
/// which are already folded into the edit).
#[derive(Debug, Clone, PartialEq)]
pub struct AutoformatMatch {
    pub edit: Edit,
    pub caret_style: Option<InlineStyle>,
}

/// Trigger table in precedence order. `*` is a string prefix of `**` and
/// `***`, so the longest marker must be tested first.
const TRIGGERS: [(
    &str,
    Option<InlineStyle>,
    Option<BlockKind>,
    ChangeLabel,
); 4] = [
    (
        "***",
        Some(InlineStyle::Underline),
        None,
        ChangeLabel::RemoveTripleAsterisk,
    ),
    (
        "**",
        Some(InlineStyle::ColorRed),
        None,
        ChangeLabel::RemoveDoubleAsterisk,
    ),
    (
        "*",
        Some(InlineStyle::Bold),
        None,
        ChangeLabel::RemoveAsterisk,
    ),
    (
        "#",
        None,
        Some(BlockKind::Header),
        ChangeLabel::RemoveHashtag,
    ),
];

/// Decide whether to intercept `incoming` before it is committed.
///
/// Runs synchronously over the pre-insertion document and selection.
/// Returns `Ok(None)` when no trigger fires, letting the normal
/// insert-character path run. On a match, the returned edit deletes
/// everything the user typed so far in the block (offsets `0..caret`) and
/// the triggering space itself is never inserted.
pub fn scan(
    doc: &Document,
    sel: &Selection,
    incoming: char,
) -> Result<Option<AutoformatMatch>, EditError> {
    if incoming != ' ' || !sel.is_collapsed() {
        return Ok(None);
    }
    sel.validate(doc)?;

    let block = sel.focus_block;
    let trimmed = doc.block(block)?.text().trim();
    for (marker, caret_style, block_kind, label) in TRIGGERS {
        if trimmed != marker {
            continue;
        }
        let mut document = doc.delete_range(block, 0, sel.focus_offset)?;
        if let Some(kind) = block_kind {
            document = document.set_block_kind(block, kind)?;
        }
        let selection = Selection::caret(block, 0);
        return Ok(Some(AutoformatMatch {
            edit: Edit {
                document,
                selection,
                label,
            },
            caret_style,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn typed(text: &str) -> (Document, Selection) {
        let doc = Document::new();
        let id = doc.blocks()[0].id;
        let doc = doc.insert_text(id, 0, text).expect("insert");
        let caret = Selection::caret(id, text.chars().count());
        (doc, caret)
    }

    #[rstest]
    #[case("*", Some(InlineStyle::Bold), ChangeLabel::RemoveAsterisk)]
    #[case("**", Some(InlineStyle::ColorRed), ChangeLabel::RemoveDoubleAsterisk)]
    #[case("***", Some(InlineStyle::Underline), ChangeLabel::RemoveTripleAsterisk)]
    #[case("#", None, ChangeLabel::RemoveHashtag)]
    fn test_trigger_precedence_and_labels(
        #[case] marker: &str,
        #[case] expected_style: Option<InlineStyle>,
        #[case] expected_label: ChangeLabel,
    ) {
        let (doc, caret) = typed(marker);
        let matched = scan(&doc, &caret, ' ')
            .unwrap()
            .expect("trigger should fire");

        assert_eq!(matched.caret_style, expected_style);
        assert_eq!(matched.edit.label, expected_label);
        // The marker text is consumed; the space is never inserted.
        assert_eq!(matched.edit.document.blocks()[0].text(), "");
        assert_eq!(matched.edit.selection.focus_offset, 0);
    }

    #[test]
    fn test_hashtag_trigger_sets_header_kind() {
        let (doc, caret) = typed("#");
        let matched = scan(&doc, &caret, ' ').unwrap().unwrap();
        assert_eq!(matched.edit.document.blocks()[0].kind, BlockKind::Header);
        assert_eq!(matched.caret_style, None);
    }

    #[test]
    fn test_marker_with_surrounding_whitespace_still_fires() {
        let doc = Document::new();
        let id = doc.blocks()[0].id;
        let doc = doc.insert_text(id, 0, "  *").expect("insert");
        let caret = Selection::caret(id, 3);
        let matched = scan(&doc, &caret, ' ').unwrap().unwrap();
        assert_eq!(matched.caret_style, Some(InlineStyle::Bold));
        assert_eq!(matched.edit.document.blocks()[0].text(), "");
    }

    #[rstest]
    #[case("****")]
    #[case("x*")]
    #[case("*x")]
    #[case("# heading")]
    #[case("")]
    fn test_non_trigger_text_is_ignored(#[case] text: &str) {
        let (doc, caret) = typed(text);
        assert_eq!(scan(&doc, &caret, ' ').unwrap(), None);
    }

    #[test]
    fn test_only_space_triggers() {
        let (doc, caret) = typed("*");
        assert_eq!(scan(&doc, &caret, 'x').unwrap(), None);
        assert_eq!(scan(&doc, &caret, '\t').unwrap(), None);
    }

    #[test]
    fn test_range_selection_never_triggers() {
        let (doc, _) = typed("*");
        let id = doc.blocks()[0].id;
        let sel = Selection::range(id, 0, id, 1);
        assert_eq!(scan(&doc, &sel, ' ').unwrap(), None);
    }
}
