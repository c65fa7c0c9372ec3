//! Manifesti grouping: wiring around the manifesti scraper, an external
//! collaborator this crate never runs. Reads the scraper's flat output list
//! and regroups it by degree type for serving.

use std::collections::HashMap;

use crate::constants::{OUTPUT_MANIFESTI_ALL_FILENAME, OUTPUT_MANIFESTI_FOLDER, OUTPUT_MANIFESTI_LIST_FILENAME};
use crate::error::Result;
use crate::model::Manifesto;
use crate::writer::FsStore;

fn group_by_degree_type(mans: &[Manifesto]) -> HashMap<String, Vec<Manifesto>> {
    let mut out: HashMap<String, Vec<Manifesto>> = HashMap::new();
    for m in mans {
        out.entry(m.degree_type.clone()).or_default().push(m.clone());
    }
    out
}

/// Reads `manifesti_list.json` at `data_root` and writes `output/manifesti/<degreeType>.json`
/// plus `output/manifesti/all.json` under `data_root`.
pub async fn write_manifesti(data_root: &std::path::Path) -> Result<()> {
    let input_store = FsStore::new(data_root).await?;
    let mans: Vec<Manifesto> = input_store.read_json(OUTPUT_MANIFESTI_LIST_FILENAME).await?;

    let store = FsStore::new(data_root.join(OUTPUT_MANIFESTI_FOLDER)).await?;
    store.write_json(OUTPUT_MANIFESTI_ALL_FILENAME, &mans, true).await?;

    let by_degree = group_by_degree_type(&mans);
    for (degree_type, group) in &by_degree {
        store
            .write_json(&format!("{degree_type}.json"), group, true)
            .await?;
    }

    Ok(())
}
