//! Column-union of per-file headers

use crate::table::ColumnSchema;

/// Build the global column list from per-file schemas, in file order
///
/// Each name is kept at the position where it is first seen, so columns from
/// earlier files always precede columns that only later files introduce.
pub fn unify_columns<'a, I>(schemas: I) -> ColumnSchema
where
    I: IntoIterator<Item = &'a ColumnSchema>,
{
    let mut global = ColumnSchema::new();
    for schema in schemas {
        for name in schema.iter() {
            global.push_unique(name);
        }
    }
    global
}

/// Move `leading` columns to the front, in the order given
///
/// Names not present in `schema` are ignored. All other columns keep their
/// relative order.
pub fn with_leading_columns<S: AsRef<str>>(schema: ColumnSchema, leading: &[S]) -> ColumnSchema {
    if leading.is_empty() {
        return schema;
    }

    let front: ColumnSchema = leading
        .iter()
        .map(|name| -> &str { name.as_ref() })
        .filter(|name| schema.contains(name))
        .collect();

    let rest = schema.iter().filter(|name| !front.contains(name));
    let ordered: ColumnSchema = front.iter().chain(rest).collect();
    ordered
}
