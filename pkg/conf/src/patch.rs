use bumpalo::Bump;

use crate::errors::*;
use crate::value::{Member, Value};

/// One edit instruction against an object level. Ops form a chain: 'next'
/// links sibling edits on the same level (ascending member indices), the
/// Pass action carries the chain for the next level down.
pub struct PatchOp<'a> {
    index: usize,
    action: PatchAction<'a>,
    next: Option<&'a PatchOp<'a>>,
}

pub enum PatchAction<'a> {
    /// Descend into the member at 'index' and apply the nested chain.
    Pass(&'a PatchOp<'a>),
    /// Append a new member at the end of the object.
    Create(&'a Member<'a>),
    /// Substitute the value of the member at 'index'.
    Replace(Value<'a>),
    /// Drop the member at 'index'.
    Delete,
}

/// Compiles a path plus an optional new value into an op chain against
/// 'root'. Returns None when the edit is declined: a delete whose terminal
/// member does not exist, an intermediate segment that does not resolve to
/// an existing object member, or a path with no segments (the root cannot
/// be edited through an op chain).
pub fn compile<'a>(
    arena: &'a Bump,
    root: Value<'a>,
    new_value: Option<Value<'a>>,
    path: &str,
) -> Option<&'a PatchOp<'a>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return None;
    }

    compile_level(arena, root, new_value, &segments)
}

fn compile_level<'a>(
    arena: &'a Bump,
    current: Value<'a>,
    new_value: Option<Value<'a>>,
    segments: &[&str],
) -> Option<&'a PatchOp<'a>> {
    let members = current.members()?;
    let segment = segments[0];
    let found = members.iter().position(|m| m.name() == segment);

    if segments.len() > 1 {
        // Intermediate level: the member must already exist.
        let index = found?;
        let child = compile_level(arena, members[index].value(), new_value, &segments[1..])?;
        return Some(arena.alloc(PatchOp {
            index,
            action: PatchAction::Pass(child),
            next: None,
        }));
    }

    let op = match (found, new_value) {
        (Some(index), Some(value)) => PatchOp {
            index,
            action: PatchAction::Replace(value),
            next: None,
        },
        (Some(index), None) => PatchOp {
            index,
            action: PatchAction::Delete,
            next: None,
        },
        (None, Some(value)) => {
            let name = Value::string_in(arena, segment);
            let member: &Member = arena.alloc(Member::new(name, value));
            PatchOp {
                index: members.len(),
                action: PatchAction::Create(member),
                next: None,
            }
        }
        // Deleting a member that does not exist.
        (None, None) => return None,
    };

    Some(arena.alloc(op))
}

/// Applies an op chain to 'src', producing a new root in 'arena'. Subtrees
/// no op descends into are shared with the source tree by reference; only
/// the objects on an op path get fresh member storage.
pub fn clone_value<'a>(
    arena: &'a Bump,
    src: Value<'a>,
    ops: Option<&PatchOp<'a>>,
) -> Result<Value<'a>> {
    let first = match ops {
        Some(op) => op,
        None => return Ok(src),
    };

    let members = match src {
        Value::Object(members) => members,
        Value::Array(_) => return Err(err_msg("cannot patch through an array")),
        _ => return Err(err_msg("patch target is not an object")),
    };

    clone_object(arena, members, first)
}

fn clone_object<'a>(
    arena: &'a Bump,
    members: &'a [Member<'a>],
    first: &PatchOp<'a>,
) -> Result<Value<'a>> {
    let mut creates = 0usize;
    let mut deletes = 0usize;
    let mut op = Some(first);
    while let Some(o) = op {
        match o.action {
            PatchAction::Create(_) => creates += 1,
            PatchAction::Delete => deletes += 1,
            _ => {}
        }
        op = o.next;
    }

    let count = members.len() + creates - deletes;
    let mut out = bumpalo::collections::Vec::with_capacity_in(count, arena);

    let mut s = 0usize;
    let mut op = Some(first);
    while let Some(o) = op {
        match &o.action {
            PatchAction::Pass(child) => {
                out.extend(members[s..o.index].iter().copied());
                let m = &members[o.index];
                out.push(Member::new(
                    copy_name(arena, m),
                    clone_value(arena, m.value(), Some(*child))?,
                ));
                s = o.index + 1;
            }
            PatchAction::Replace(value) => {
                out.extend(members[s..o.index].iter().copied());
                let m = &members[o.index];
                out.push(Member::new(copy_name(arena, m), *value));
                s = o.index + 1;
            }
            PatchAction::Delete => {
                out.extend(members[s..o.index].iter().copied());
                s = o.index + 1;
            }
            PatchAction::Create(member) => {
                out.extend(members[s..].iter().copied());
                s = members.len();
                out.push(**member);
            }
        }
        op = o.next;
    }
    out.extend(members[s..].iter().copied());

    debug_assert_eq!(out.len(), count);
    Ok(Value::Object(out.into_bump_slice()))
}

fn copy_name<'a>(arena: &'a Bump, member: &Member<'a>) -> Value<'a> {
    match member.name_value() {
        Value::String(s) => Value::String(arena.alloc_str(s)),
        other => other,
    }
}
