use reportline_engine::engine::Workbook;

use super::definition::ReportDefinition;
use crate::binder::{bind, resolve_pattern};
use crate::error::{ReportError, Result};
use crate::model::Model;
use crate::paginate::{Page, paginate};
use crate::recompute::recompute_plan;
use crate::template::{Template, TemplateLoader};

/// Finished documents of one report request.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedReport {
    /// Suggested filename, resolved from the report parameters.
    pub filename: String,
    /// One workbook per document, in page order for paginated reports.
    pub documents: Vec<Workbook>,
    paginated: bool,
}

impl RenderedReport {
    pub fn is_paginated(&self) -> bool {
        self.paginated
    }

    /// Each document with the filename it should be stored under.
    ///
    /// Paginated documents get a 1-based page suffix before the extension:
    /// `attendance_list_3_2024.grd` becomes `attendance_list_3_2024_1.grd`.
    pub fn named_documents(&self) -> Vec<(String, &Workbook)> {
        if !self.paginated {
            return self
                .documents
                .iter()
                .map(|doc| (self.filename.clone(), doc))
                .collect();
        }
        let (stem, ext) = match self.filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (self.filename.as_str(), None),
        };
        self.documents
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let name = match ext {
                    Some(ext) => format!("{}_{}.{}", stem, index + 1, ext),
                    None => format!("{}_{}", stem, index + 1),
                };
                (name, doc)
            })
            .collect()
    }
}

/// Conventional model for one page: the report parameters plus `field_i`
/// slots for the page's entities.
pub fn page_model(params: &Model, page: &Page<'_, Model>) -> Model {
    Model::builder()
        .extend(params)
        .slots(page.capacity(), page.iter())
        .build()
}

/// Renders report definitions against templates from a loader.
#[derive(Clone, Debug)]
pub struct ReportGenerator<L> {
    loader: L,
}

impl<L: TemplateLoader> ReportGenerator<L> {
    pub fn new(loader: L) -> ReportGenerator<L> {
        ReportGenerator { loader }
    }

    /// Render a single-document report bound to `model`.
    pub fn generate(&self, definition: &ReportDefinition, model: &Model) -> Result<RenderedReport> {
        definition.validate()?;
        let filename = resolve_pattern(&definition.filename, model)?;
        let template = self.loader.load(&definition.template)?;
        let document = self.render(definition, &template, model)?;
        log::debug!("rendered report {:?} as {}", definition.name, filename);

        Ok(RenderedReport {
            filename,
            documents: vec![document],
            paginated: false,
        })
    }

    /// Render one document per page of `entities`.
    ///
    /// `factory` builds each page's model from the report parameters, the
    /// page and its 0-based index. An empty entity list renders no
    /// documents. The filename is resolved against `params`.
    pub fn generate_paged<E, F>(
        &self,
        definition: &ReportDefinition,
        params: &Model,
        entities: &[E],
        mut factory: F,
    ) -> Result<RenderedReport>
    where
        F: FnMut(&Model, &Page<'_, E>, usize) -> Result<Model>,
    {
        definition.validate()?;
        let capacity = definition
            .page_capacity
            .ok_or(ReportError::InvalidCapacity(0))?;
        let filename = resolve_pattern(&definition.filename, params)?;
        let template = self.loader.load(&definition.template)?;
        let pages = paginate(entities, capacity)?;

        let mut documents = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let model = factory(params, page, index)?;
            documents.push(self.render(definition, &template, &model)?);
            log::debug!(
                "rendered page {} of {} for report {:?} ({} entities)",
                index + 1,
                pages.len(),
                definition.name,
                page.len()
            );
        }

        Ok(RenderedReport {
            filename,
            documents,
            paginated: true,
        })
    }

    fn render(
        &self,
        definition: &ReportDefinition,
        template: &Template,
        model: &Model,
    ) -> Result<Workbook> {
        let mut workbook = template.instantiate()?;
        bind(&mut workbook, model)?;
        if let Some(plan) = &definition.recompute {
            let report = recompute_plan(&mut workbook, plan)?;
            log::debug!(
                "{}: {} rows recomputed, {} skipped",
                template.name(),
                report.rows_evaluated,
                report.rows_skipped
            );
        }
        Ok(workbook)
    }
}
