//src/taxdb.rs

use std::io::BufRead;
use std::path::Path;

use ahash::{AHashMap, AHashSet};

use crate::error::{Result, WrangleError};
use crate::io::open_input;

pub type ParentMap = AHashMap<u32, u32>;
pub type NameMap = AHashMap<u32, String>;
pub type RankMap = AHashMap<u32, String>;

/// Read-only taxonomy service handed to the lineage resolver.
pub trait TaxonomyLookup {
    fn parent(&self, taxid: u32) -> Option<u32>;
    fn name(&self, taxid: u32) -> Option<&str>;
    fn rank(&self, taxid: u32) -> Option<&str>;
    /// Translates a scientific name into a taxon ID.
    fn translate(&self, name: &str) -> Option<u32>;

    /// Path from `taxid` up to the root, `taxid` first.
    /// Returns `None` when the taxon is unknown.
    fn lineage(&self, taxid: u32) -> Option<Vec<u32>> {
        self.parent(taxid)?;
        let mut path = vec![taxid];
        let mut seen = AHashSet::new();
        seen.insert(taxid);
        let mut current = taxid;
        while let Some(parent) = self.parent(current) {
            // the root points at itself; a revisited node means a broken dump
            if !seen.insert(parent) {
                break;
            }
            path.push(parent);
            current = parent;
        }
        Some(path)
    }
}

/// In-memory taxonomy tree.
#[derive(Debug, Default)]
pub struct TaxonomyDb {
    parent_map: ParentMap,
    name_map: NameMap,
    rank_map: RankMap,
    /// lowercase scientific name -> taxid
    name_index: AHashMap<String, u32>,
}

impl TaxonomyDb {
    /// Parses a taxDB file in the format:
    /// ```text
    /// <taxid>\t<parentid>\t<taxname>\t<rank>
    /// ```
    pub fn from_taxdb<P: AsRef<Path>>(filepath: P) -> Result<Self> {
        Self::from_taxdb_reader(open_input(filepath)?)
    }

    pub fn from_taxdb_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut db = TaxonomyDb::default();

        for line_result in reader.lines() {
            let line = line_result?;
            // e.g. "2   131567   Bacteria   superkingdom"
            let parts: Vec<&str> = line.split('\t').collect();

            // Skip malformed lines
            if parts.len() < 4 {
                continue;
            }

            let taxid: u32 = parts[0].trim().parse().unwrap_or(0);
            let parentid: u32 = parts[1].trim().parse().unwrap_or(0);

            if taxid != 0 {
                db.insert(taxid, parentid, parts[2].trim(), parts[3].trim());
            }
        }

        db.check_loaded("taxDB file")?;
        Ok(db)
    }

    /// Loads `nodes.dmp` and `names.dmp` from an NCBI taxdump directory.
    /// Only scientific names are kept.
    pub fn from_taxdump<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let nodes = open_input(dir.join("nodes.dmp"))?;
        let names = open_input(dir.join("names.dmp"))?;
        Self::from_taxdump_readers(nodes, names)
    }

    pub fn from_taxdump_readers<N: BufRead, M: BufRead>(nodes: N, names: M) -> Result<Self> {
        let mut db = TaxonomyDb::default();

        // nodes.dmp: tax_id | parent tax_id | rank | ...
        for line_result in nodes.lines() {
            let line = line_result?;
            let mut fields = dmp_fields(&line);
            let (Some(taxid), Some(parent), Some(rank)) = (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let (Ok(taxid), Ok(parent)) = (taxid.parse::<u32>(), parent.parse::<u32>()) else {
                continue;
            };
            db.parent_map.insert(taxid, parent);
            db.rank_map.insert(taxid, rank.to_string());
        }

        // names.dmp: tax_id | name_txt | unique name | name class |
        for line_result in names.lines() {
            let line = line_result?;
            let fields: Vec<&str> = dmp_fields(&line).collect();
            if fields.len() < 4 || fields[3] != "scientific name" {
                continue;
            }
            let Ok(taxid) = fields[0].parse::<u32>() else {
                continue;
            };
            if db.parent_map.contains_key(&taxid) {
                db.index_name(taxid, fields[1]);
                db.name_map.insert(taxid, fields[1].to_string());
            }
        }

        db.check_loaded("taxdump")?;
        Ok(db)
    }

    fn insert(&mut self, taxid: u32, parent: u32, name: &str, rank: &str) {
        self.parent_map.insert(taxid, parent);
        self.name_map.insert(taxid, name.to_string());
        self.rank_map.insert(taxid, rank.to_string());
        self.index_name(taxid, name);
    }

    fn index_name(&mut self, taxid: u32, name: &str) {
        // homonyms resolve to the smallest taxid so lookups are deterministic
        self.name_index
            .entry(name.to_lowercase())
            .and_modify(|id| *id = (*id).min(taxid))
            .or_insert(taxid);
    }

    fn check_loaded(&self, what: &str) -> Result<()> {
        if self.parent_map.is_empty() {
            return Err(WrangleError::Taxonomy(format!("{what} contains no taxa")));
        }
        log::info!("Loaded {} taxa from {what}", self.parent_map.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.parent_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent_map.is_empty()
    }
}

fn dmp_fields(line: &str) -> impl Iterator<Item = &str> {
    line.trim_end_matches(|c: char| c == '|' || c == '\t')
        .split("\t|\t")
        .map(str::trim)
}

impl TaxonomyLookup for TaxonomyDb {
    fn parent(&self, taxid: u32) -> Option<u32> {
        self.parent_map.get(&taxid).copied()
    }

    fn name(&self, taxid: u32) -> Option<&str> {
        self.name_map.get(&taxid).map(String::as_str)
    }

    fn rank(&self, taxid: u32) -> Option<&str> {
        self.rank_map.get(&taxid).map(String::as_str)
    }

    fn translate(&self, name: &str) -> Option<u32> {
        self.name_index.get(&name.trim().to_lowercase()).copied()
    }
}
