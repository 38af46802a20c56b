use serde::Serialize;

use pharmacie_catalog::Medication;
use pharmacie_reorder::{CategoryGroup, RedundancyGap, ReorderCandidates};

#[derive(Debug, Serialize)]
pub struct MedicationDto {
    pub reference: i32,
    pub name: String,
    pub units_in_stock: u32,
    pub reorder_level: u32,
}

#[derive(Debug, Serialize)]
pub struct CategoryCandidatesDto {
    pub code: i32,
    pub label: String,
    pub medications: Vec<MedicationDto>,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub categories: Vec<CategoryCandidatesDto>,
}

#[derive(Debug, Serialize)]
pub struct RedundancyGapDto {
    pub code: i32,
    pub label: String,
    pub supplier_count: usize,
}

#[derive(Debug, Serialize)]
pub struct RedundancyResponse {
    pub min_suppliers: usize,
    pub gaps: Vec<RedundancyGapDto>,
}

pub fn medication_to_dto(m: &Medication) -> MedicationDto {
    MedicationDto {
        reference: m.reference().get(),
        name: m.name().to_string(),
        units_in_stock: m.units_in_stock(),
        reorder_level: m.reorder_level(),
    }
}

fn group_to_dto(g: &CategoryGroup) -> CategoryCandidatesDto {
    CategoryCandidatesDto {
        code: g.category.code().get(),
        label: g.category.label().to_string(),
        medications: g.medications.iter().map(medication_to_dto).collect(),
    }
}

pub fn candidates_to_response(candidates: &ReorderCandidates) -> CandidatesResponse {
    CandidatesResponse {
        categories: candidates.groups().iter().map(group_to_dto).collect(),
    }
}

pub fn redundancy_to_response(min_suppliers: usize, gaps: &[RedundancyGap]) -> RedundancyResponse {
    RedundancyResponse {
        min_suppliers,
        gaps: gaps
            .iter()
            .map(|g| RedundancyGapDto {
                code: g.category.code().get(),
                label: g.category.label().to_string(),
                supplier_count: g.supplier_count,
            })
            .collect(),
    }
}
