use crate::value::Value;

impl<'a> Value<'a> {
    /// Walks a slash-delimited path of member names, one object level per
    /// segment. The empty path selects the value itself; zero-length
    /// segments are skipped, so "/" also selects the root. A missing member
    /// or a non-object in the middle of the walk yields None.
    pub fn get_path(&self, path: &str) -> Option<Value<'a>> {
        let mut current = *self;

        for segment in path.split('/') {
            if segment.is_empty() {
                continue;
            }
            current = current.get_field(segment)?;
        }

        Some(current)
    }
}
