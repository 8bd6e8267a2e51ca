//! Backwards compatibility of a signature change.
//!
//! A modification is compatible only when every existing call keeps working
//! unchanged: new parameters carry defaults and are appended to the positional
//! list or added among keyword-only parameters, nothing else moves, and the
//! return annotation is the same.

use crate::parser::signature::{self, ParamKind, ParsedSignature};

/// Whether moving from `old` to `new` signature text keeps callers working.
///
/// Unparsable signatures are never compatible.
pub fn is_compatible_signature_change(old: &str, new: &str) -> bool {
    let (Some(old), Some(new)) = (signature::parse(old), signature::parse(new)) else {
        return false;
    };
    if old.return_annotation != new.return_annotation {
        return false;
    }

    let insertable = insertable_positions(&old);
    let mut i = 0;
    let mut inserted = 0;
    for param in &new.params {
        if i < old.params.len() && old.params[i] == *param {
            i += 1;
            continue;
        }
        let new_slot_ok = match param.kind {
            ParamKind::Regular => param.has_default(),
            ParamKind::KeywordOnlyMarker => true,
            _ => false,
        };
        if !new_slot_ok || !insertable[i] {
            return false;
        }
        inserted += 1;
    }

    i == old.params.len() && inserted > 0
}

/// `result[i]` is true when a parameter may be inserted before `old[i]`
/// (index `old.len()` meaning "at the end") without shifting any positional
/// slot a caller could be using.
fn insertable_positions(signature: &ParsedSignature) -> Vec<bool> {
    let old = &signature.params;
    let keyword_only_from = signature.keyword_only_start().unwrap_or(old.len());

    let mut result = vec![false; old.len() + 1];
    result[old.len()] = true;
    for i in (0..old.len()).rev() {
        let tail_is_keyword_only = result[i + 1]
            && (i >= keyword_only_from
                || matches!(old[i].kind, ParamKind::KeywordOnlyMarker | ParamKind::VarKeyword));
        if !tail_is_keyword_only {
            break;
        }
        result[i] = true;
    }
    result
}
