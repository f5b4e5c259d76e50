use super::{parse_table, Extractor, PageProfile, Profile};
use crate::document::Document;
use crate::error::Result;
use crate::fields::FieldSet;
use crate::reference::Reference;
use crate::value::{RowList, Value};

pub const COMBATIVE_RIDERS: FieldSet = FieldSet::new(&["stage_name", "stage_url", "rider_name", "rider_url", "nationality"]);

/// Most combative rider of every stage,
/// `race/{id}/{year}/results/combative-riders`
pub struct RaceCombativeRiders {
    reference: Reference,
    document: Document,
}

impl RaceCombativeRiders {
    pub fn combative_riders(&self, fields: &[&str]) -> Result<RowList> {
        let fields = COMBATIVE_RIDERS.select(fields)?;
        parse_table(self.document.first("table")?, &fields)
    }
}

impl PageProfile for RaceCombativeRiders {
    const PROFILE: Profile = Profile::RaceCombativeRiders;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        vec![Extractor::required("combative_riders", |c: &RaceCombativeRiders| {
            c.combative_riders(&[]).map(Value::from)
        })]
    }
}
