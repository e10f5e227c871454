//src/lineage.rs

use std::io::{BufRead, Write};

use crate::error::Result;
use crate::ranks::Rank;
use crate::taxdb::TaxonomyLookup;

/// What to print for each requested rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    Id,
    #[default]
    Name,
    /// `<id>:<name>`
    Both,
}

#[derive(Debug, Clone)]
pub struct LineageOptions {
    pub value_kind: ValueKind,
    /// Printed for ranks absent from a lineage.
    pub sentinel: String,
    pub comment_char: char,
    pub no_header: bool,
    /// 1-based key column; the last column when `None`.
    pub key_column: Option<usize>,
}

impl Default for LineageOptions {
    fn default() -> Self {
        Self {
            value_kind: ValueKind::Name,
            sentinel: "NA".to_string(),
            comment_char: '#',
            no_header: false,
            key_column: None,
        }
    }
}

/// Projects taxon lineages onto an ordered list of ranks.
pub struct LineageResolver<'a, T: TaxonomyLookup> {
    taxonomy: &'a T,
    ranks: Vec<Rank>,
    value_kind: ValueKind,
    sentinel: String,
}

impl<'a, T: TaxonomyLookup> LineageResolver<'a, T> {
    pub fn new(taxonomy: &'a T, ranks: Vec<Rank>, value_kind: ValueKind, sentinel: &str) -> Self {
        Self {
            taxonomy,
            ranks,
            value_kind,
            sentinel: sentinel.to_string(),
        }
    }

    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    fn missing(&self) -> Vec<String> {
        vec![self.sentinel.clone(); self.ranks.len()]
    }

    /// Resolves a taxon key (numeric ID or scientific name) to one value per
    /// requested rank. The flag is `false` when the row is entirely missing.
    pub fn resolve_key(&self, key: &str) -> (Vec<String>, bool) {
        let key = key.trim();

        // unassigned and root short-circuit without touching the tree
        if key.is_empty() || key == "0" || key == "1" {
            return (self.missing(), false);
        }

        let taxid = match key.parse::<u32>() {
            Ok(id) => id,
            Err(_) => match self.taxonomy.translate(key) {
                Some(id) => id,
                None => {
                    log::warn!("Could not translate taxon name '{key}'; reporting it as missing");
                    return (self.missing(), false);
                }
            },
        };

        match self.resolve_taxid(taxid) {
            Some(values) => (values, true),
            None => {
                log::warn!("Taxon ID {taxid} is not in the taxonomy; reporting it as missing");
                (self.missing(), false)
            }
        }
    }

    /// Values per rank for a known taxid, `None` if the taxid is unknown.
    pub fn resolve_taxid(&self, taxid: u32) -> Option<Vec<String>> {
        let path = self.taxonomy.lineage(taxid)?;

        let values = self
            .ranks
            .iter()
            .map(|rank| {
                path.iter()
                    .copied()
                    .find(|&id| self.taxonomy.rank(id).is_some_and(|r| rank.matches(r)))
                    .map(|id| self.format_value(id))
                    .unwrap_or_else(|| self.sentinel.clone())
            })
            .collect();
        Some(values)
    }

    fn format_value(&self, taxid: u32) -> String {
        let name = self.taxonomy.name(taxid).unwrap_or(self.sentinel.as_str());
        match self.value_kind {
            ValueKind::Id => taxid.to_string(),
            ValueKind::Name => name.to_string(),
            ValueKind::Both => format!("{taxid}:{name}"),
        }
    }
}

/// Row counts reported after a table has been processed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    pub rows: usize,
    pub missing: usize,
}

/// Appends one column per requested rank to a tab-separated table.
///
/// Comment and blank lines pass through untouched. The first remaining line
/// is treated as a header unless `opts.no_header` is set.
pub fn resolve_table<R, W, T>(
    reader: R,
    writer: &mut W,
    resolver: &LineageResolver<'_, T>,
    opts: &LineageOptions,
) -> Result<ResolveStats>
where
    R: BufRead,
    W: Write + ?Sized,
    T: TaxonomyLookup,
{
    let mut stats = ResolveStats::default();
    let mut header_pending = !opts.no_header;

    for line_result in reader.lines() {
        let line = line_result?;
        let line = line.trim_end_matches('\r');

        if line.is_empty() || line.starts_with(opts.comment_char) {
            writeln!(writer, "{line}")?;
            continue;
        }

        if header_pending {
            header_pending = false;
            let rank_names: Vec<&str> = resolver.ranks().iter().map(Rank::name).collect();
            writeln!(writer, "{line}\t{}", rank_names.join("\t"))?;
            continue;
        }

        let key = key_field(line, opts.key_column);
        let (values, found) = resolver.resolve_key(key);
        stats.rows += 1;
        if !found {
            stats.missing += 1;
        }
        writeln!(writer, "{line}\t{}", values.join("\t"))?;
    }

    log::info!(
        "Resolved {} rows ({} without a lineage)",
        stats.rows,
        stats.missing
    );
    Ok(stats)
}

fn key_field(line: &str, key_column: Option<usize>) -> &str {
    match key_column {
        Some(col) if col > 0 => line.split('\t').nth(col - 1).unwrap_or(""),
        _ => line.rsplit('\t').next().unwrap_or(""),
    }
}
