//! In-memory configuration trees: a strict integer-only JSON parser and
//! printer, slash-path lookup, and an overlay-patch engine that produces
//! structurally shared copies. All values live in a caller-provided arena
//! and are released with it as a unit; there is no per-value free.

pub mod errors;
mod parser;
mod patch;
mod path;
mod printer;
mod value;

pub use bumpalo::Bump as Arena;

pub use parser::parse;
pub use patch::{clone_value, compile, PatchAction, PatchOp};
pub use printer::{print, print_pretty};
pub use value::{Member, ShortString, Value, MAX_SHORT_STRING};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_patch_print() {
        let arena = Arena::new();

        let root = parse(&arena, br#"{"listeners":{},"routes":[]}"#).unwrap();

        let pass = parse(&arena, br#"{"pass":"routes"}"#).unwrap();
        let ops = compile(&arena, root, Some(pass), "/listeners/*:8080").unwrap();
        let patched = clone_value(&arena, root, Some(ops)).unwrap();

        assert_eq!(
            print(&patched),
            r#"{"listeners":{"*:8080":{"pass":"routes"}},"routes":[]}"#
        );
        assert_eq!(
            patched
                .get_path("/listeners/*:8080/pass")
                .and_then(|v| v.get_string().map(str::to_string)),
            Some("routes".to_string())
        );
    }
}
