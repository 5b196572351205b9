use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write as _,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    ast::Procedure,
    error::LoadError,
    interpreter::parser::core::{ParseResult, parse_procedure},
    operator::{
        record::{
            Arity, Associativity, DefinitionKind, Fixedness, OperatorData, OperatorId,
            OperatorRecord, RecursionUsage,
        },
        registry::OperatorRegistry,
    },
};

/// One line of the record store.
///
/// Procedures are stored as text with callees named by their current id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOperator {
    pub id:            OperatorId,
    pub symbol:        String,
    pub arity:         Arity,
    #[serde(default)]
    pub fixedness:     Option<Fixedness>,
    #[serde(default)]
    pub base:          Option<u32>,
    #[serde(default)]
    pub definition:    Option<String>,
    pub kind:          DefinitionKind,
    #[serde(default)]
    pub precedence:    Option<u32>,
    #[serde(default)]
    pub associativity: Option<Associativity>,
    #[serde(default)]
    pub order:         Option<u32>,
    #[serde(default)]
    pub compute:       Option<String>,
    #[serde(default)]
    pub cost:          Option<String>,
    #[serde(default)]
    pub dependencies:  Vec<OperatorId>,
    #[serde(default)]
    pub temporary:     bool,
    #[serde(default)]
    pub recursion:     RecursionUsage,
}

impl StoredOperator {
    /// Captures a record, rendering its procedures with current ids.
    ///
    /// Returns `None` if a procedure calls an operator that is no longer
    /// registered.
    #[must_use]
    pub fn from_record(record: &OperatorRecord, registry: &OperatorRegistry) -> Option<Self> {
        let render = |procedure: Option<&Procedure>| {
            procedure.map(|p| p.to_source(&|key| registry.id_of(key)))
                     .transpose()
        };
        let compute = render(record.compute()).ok()?;
        let cost = render(record.cost()).ok()?;

        Some(Self { id: record.id(),
                    symbol: record.symbol().to_string(),
                    arity: record.arity(),
                    fixedness: record.fixedness(),
                    base: record.base(),
                    definition: record.definition().map(str::to_string),
                    kind: record.kind(),
                    precedence: record.precedence(),
                    associativity: record.associativity(),
                    order: record.order(),
                    compute,
                    cost,
                    dependencies: record.dependencies()
                                        .iter()
                                        .filter_map(|key| registry.id_of(*key))
                                        .collect(),
                    temporary: record.is_temporary(),
                    recursion: record.recursion() })
    }

    fn data(&self) -> OperatorData {
        OperatorData { id:            Some(self.id),
                       symbol:        self.symbol.clone(),
                       arity:         self.arity,
                       fixedness:     self.fixedness,
                       base:          self.base,
                       definition:    self.definition.clone(),
                       kind:          self.kind,
                       precedence:    self.precedence,
                       associativity: self.associativity,
                       order:         self.order,
                       compute:       None,
                       cost:          None,
                       recursion:     self.recursion,
                       temporary:     self.temporary, }
    }
}

impl OperatorRegistry {
    /// Loads line-delimited operator records into the registry.
    ///
    /// Every well-formed line is inserted first; procedures and dependencies
    /// are resolved once all ids are known. Malformed lines, duplicate ids,
    /// unparsable procedures and records that end up referencing a dropped
    /// operator are logged and skipped. Surviving ids are kept as stored.
    ///
    /// # Returns
    /// The number of operators loaded.
    pub fn load(&mut self, source: &str) -> usize {
        let mut pending = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let stored: StoredOperator = match serde_json::from_str(line) {
                Ok(stored) => stored,
                Err(error) => {
                    warn!(line = index + 1, %error, "skipping malformed operator record");
                    continue;
                },
            };
            match self.add(stored.data()) {
                Ok(_) => pending.push(stored),
                Err(error) => warn!(line = index + 1, %error, "skipping operator record"),
            }
        }

        let mut rejected = Vec::new();
        for stored in &pending {
            if let Err(error) = self.attach(stored) {
                warn!(id = %stored.id, %error, "dropping operator with unusable procedures");
                rejected.push(stored.id);
            }
        }
        for id in rejected {
            if let Err(error) = self.remove(id) {
                warn!(%id, %error, "failed to remove rejected operator");
            }
        }
        self.drop_dangling();

        let loaded = self.len();
        info!(loaded, lines = pending.len(), "operators loaded");
        loaded
    }

    fn attach(&mut self, stored: &StoredOperator) -> Result<(), Box<dyn std::error::Error>> {
        let compute = self.parse_stored(stored.compute.as_deref())?;
        let cost = self.parse_stored(stored.cost.as_deref())?;
        self.set_procedures(stored.id, compute, cost)?;
        self.set_dependencies(stored.id, &stored.dependencies)?;
        Ok(())
    }

    fn parse_stored(&self, source: Option<&str>) -> ParseResult<Option<Procedure>> {
        source.map(|s| parse_procedure(s, &|id| self.key_of(id)))
              .transpose()
    }

    fn drop_dangling(&mut self) {
        loop {
            let dangling: Vec<OperatorId> = self.iter()
                                                .filter(|r| {
                                                    r.references()
                                                     .iter()
                                                     .any(|key| self.record(*key).is_none())
                                                })
                                                .map(OperatorRecord::id)
                                                .collect();
            if dangling.is_empty() {
                return;
            }
            for id in dangling {
                warn!(%id, "dropping operator that references a dropped operator");
                if let Err(error) = self.remove(id) {
                    warn!(%id, %error, "failed to remove dangling operator");
                    return;
                }
            }
        }
    }

    /// Renders every record as one JSON line, in id order.
    ///
    /// # Errors
    /// `Json` if a record cannot be serialized.
    pub fn to_jsonl(&self) -> Result<String, LoadError> {
        let mut out = String::new();
        for record in self.iter() {
            let Some(stored) = StoredOperator::from_record(record, self) else {
                warn!(id = %record.id(), "not saving operator with a dangling reference");
                continue;
            };
            out.push_str(&serde_json::to_string(&stored)?);
            out.push('\n');
        }
        Ok(out)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io { path: path.to_path_buf(),
                                  source }
}

/// Reads a record store file into `registry`.
///
/// # Errors
/// `Io` if the file cannot be read. Bad lines are skipped, not reported.
pub fn load_file(registry: &mut OperatorRegistry, path: &Path) -> Result<usize, LoadError> {
    let source = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(registry.load(&source))
}

/// Overwrites `path` with every record of `registry`.
///
/// # Errors
/// `Io` or `Json` on failure.
pub fn save(registry: &OperatorRegistry, path: &Path) -> Result<(), LoadError> {
    fs::write(path, registry.to_jsonl()?).map_err(io_error(path))?;
    info!(path = %path.display(), operators = registry.len(), "operators saved");
    Ok(())
}

/// Appends one accepted operator to the temp file at `path`.
///
/// An unknown operator, or one with a dangling reference, is skipped with a
/// warning.
///
/// # Errors
/// `Io` or `Json` when writing fails.
pub fn append_temporary(registry: &OperatorRegistry, id: OperatorId, path: &Path) -> Result<(), LoadError> {
    let Some(stored) = registry.get(id)
                               .ok()
                               .and_then(|record| StoredOperator::from_record(record, registry))
    else {
        warn!(%id, "cannot append unknown operator");
        return Ok(());
    };
    let mut line = serde_json::to_string(&stored)?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true)
                                     .append(true)
                                     .open(path)
                                     .map_err(io_error(path))?;
    file.write_all(line.as_bytes()).map_err(io_error(path))?;
    debug!(%id, path = %path.display(), "operator appended");
    Ok(())
}

/// Truncates the temp file, creating it if needed.
///
/// # Errors
/// `Io` if the file cannot be written.
pub fn clear_temp_file(path: &Path) -> Result<(), LoadError> {
    fs::write(path, "").map_err(io_error(path))
}

/// Replaces `path` with the temp file.
///
/// # Errors
/// `Io` if the rename fails.
pub fn promote_temp_file(temp: &Path, path: &Path) -> Result<(), LoadError> {
    fs::rename(temp, path).map_err(io_error(temp))
}

/// Reverse index from operator id to the ids of expressions using it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorExpressionIndex {
    entries: BTreeMap<OperatorId, Vec<u64>>,
}

#[derive(Serialize)]
struct IndexLine<'a> {
    op_id:   OperatorId,
    expr_id: &'a [u64],
}

impl OperatorExpressionIndex {
    /// Records that expression `expression` uses `operator`. Repeated uses
    /// within one expression are stored once.
    pub fn record(&mut self, operator: OperatorId, expression: u64) {
        let ids = self.entries.entry(operator).or_default();
        if ids.last() != Some(&expression) {
            ids.push(expression);
        }
    }

    /// Expressions recorded for `operator`.
    #[must_use]
    pub fn expressions(&self, operator: OperatorId) -> &[u64] {
        self.entries.get(&operator).map_or(&[], Vec::as_slice)
    }

    /// Renders `{"op_id": N, "expr_id": [..]}` lines in operator order.
    ///
    /// # Errors
    /// `Json` if serialization fails.
    pub fn to_jsonl(&self) -> Result<String, LoadError> {
        let mut out = String::new();
        for (op_id, ids) in &self.entries {
            out.push_str(&serde_json::to_string(&IndexLine { op_id:   *op_id,
                                                             expr_id: ids, })?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Overwrites `path` with the index.
    ///
    /// # Errors
    /// `Io` or `Json` on failure.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        fs::write(path, self.to_jsonl()?).map_err(io_error(path))
    }
}

/// Writes one JSON line per record to `path`, replacing its contents.
///
/// # Returns
/// The number of lines written.
///
/// # Errors
/// `Io` or `Json` on failure.
pub fn write_jsonl<T, I>(path: &Path, records: I) -> Result<usize, LoadError>
    where T: Serialize,
          I: IntoIterator<Item = T>
{
    let file = fs::File::create(path).map_err(io_error(path))?;
    let mut out = std::io::BufWriter::new(file);
    let mut written = 0;
    for record in records {
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n").map_err(io_error(path))?;
        written += 1;
    }
    out.flush().map_err(io_error(path))?;
    info!(path = %path.display(), written, "records written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::Slot, interpreter::value::core::Value, operator::seed::set_initial_operators};

    #[test]
    fn saved_registry_loads_back_identically() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        let text = registry.to_jsonl().unwrap();

        let mut loaded = OperatorRegistry::new();
        assert_eq!(loaded.load(&text), 6);
        assert_eq!(loaded.to_jsonl().unwrap(), text);

        let times = loaded.key_of(OperatorId(4)).unwrap();
        assert_eq!(loaded.apply(times, Slot::Cost, &[(-3).into(), 5.into()]).unwrap(),
                   Value::Integer(3));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let source = r##"{"id": 1, "symbol": "+", "arity": "binary", "kind": "base", "compute": "(a, b) => a + b"}
not json at all

{"id": 2, "symbol": "⊕", "arity": "binary", "kind": "plain", "compute": "(a, b) => op_1(a, b) +"}
{"id": 3, "symbol": "⊗", "arity": "binary", "kind": "plain", "compute": "(a, b) => op_2(a, b)"}
{"id": 1, "symbol": "#", "arity": "binary", "kind": "plain"}
"##;
        let mut registry = OperatorRegistry::new();
        assert_eq!(registry.load(source), 1);
        assert_eq!(registry.get(OperatorId(1)).unwrap().symbol(), "+");
    }

    #[test]
    fn rejected_records_take_their_dependents_along() {
        let source = r#"{"id": 1, "symbol": "+", "arity": "binary", "kind": "base", "compute": "(a, b) => a + b"}
{"id": 2, "symbol": "⊕", "arity": "binary", "kind": "plain", "compute": "(a, b) => op_1(a, b) +"}
{"id": 3, "symbol": "⊗", "arity": "binary", "kind": "plain", "compute": "(a, b) => op_2(a, b)"}
{"id": 4, "symbol": "⊘", "arity": "binary", "kind": "plain", "compute": "(a, b) => op_3(a, b) + op_1(a, b)"}
{"id": 5, "symbol": "⊙", "arity": "binary", "kind": "plain", "compute": "(a, b) => op_1(b, a)"}
"#;
        let mut registry = OperatorRegistry::new();
        assert_eq!(registry.load(source), 2);
        assert!(registry.get(OperatorId(3)).is_err());
        assert!(registry.get(OperatorId(4)).is_err());
        assert_eq!(registry.get(OperatorId(5)).unwrap().symbol(), "⊙");
    }

    #[test]
    fn stored_order_is_kept_on_load() {
        let source = r#"{"id": 1, "symbol": "+", "arity": "binary", "kind": "base", "order": 1, "compute": "(a, b) => a + b"}
{"id": 2, "symbol": "⊕", "arity": "binary", "kind": "plain", "order": 4, "compute": "(a, b) => op_1(a, b)", "dependencies": [1]}
"#;
        let mut registry = OperatorRegistry::new();
        assert_eq!(registry.load(source), 2);
        assert_eq!(registry.get(OperatorId(2)).unwrap().order(), Some(4));
        assert_eq!(registry.calculate_order(OperatorId(2)), Some(1));
        assert_eq!(registry.get(OperatorId(2)).unwrap().order(), Some(1));
    }

    #[test]
    fn temp_file_is_appended_and_promoted() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("operators.tmp.jsonl");
        let target = dir.path().join("operators.jsonl");

        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();

        clear_temp_file(&temp).unwrap();
        append_temporary(&registry, OperatorId(1), &temp).unwrap();
        append_temporary(&registry, OperatorId(4), &temp).unwrap();
        promote_temp_file(&temp, &target).unwrap();

        assert!(!temp.exists());
        let written = fs::read_to_string(&target).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[test]
    fn index_lines_use_op_id_and_expr_id() {
        let mut index = OperatorExpressionIndex::default();
        index.record(OperatorId(2), 1);
        index.record(OperatorId(2), 1);
        index.record(OperatorId(2), 4);
        index.record(OperatorId(1), 4);

        assert_eq!(index.to_jsonl().unwrap(),
                   "{\"op_id\":1,\"expr_id\":[4]}\n{\"op_id\":2,\"expr_id\":[1,4]}\n");
    }
}
