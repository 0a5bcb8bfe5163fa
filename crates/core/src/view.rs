//! Results view-model.
//!
//! Projects an [`AnalysisResult`] onto a fixed, ordered list of sections.
//! The order is contractual: tests assert it, and the renderer emits the
//! sections exactly as given. A section whose backing field is absent or
//! empty is omitted entirely, except for the extracted text and the
//! insights grid, which are always shown.

use mrp_types::{AnalysisResult, EncounterInfo, Insight, LifestyleEntry, PatientInfo, Row};

/// One display section of the results page, in render order.
#[derive(Debug, PartialEq)]
pub enum Section<'a> {
    /// Patient demographics, with encounter details when present.
    Patient {
        patient: &'a PatientInfo,
        encounter: Option<&'a EncounterInfo>,
    },
    /// Clinical summary paragraph.
    Summary(&'a str),
    /// A four-column table of [`Row`]s.
    Table {
        title: &'static str,
        headers: [&'static str; 4],
        rows: &'a [Row],
    },
    /// A bare bullet list.
    List {
        title: &'static str,
        items: &'a [String],
    },
    /// Lifestyle recommendation cards.
    Lifestyle(&'a [LifestyleEntry]),
    /// Disclaimer block.
    Disclaimer(&'a str),
    /// Raw extracted text, collapsed by default. Always present.
    ExtractedText(&'a str),
    /// Health insights grid. Always present.
    Insights(&'a [Insight]),
}

/// Builds the ordered section list for a document.
pub fn build_sections(result: &AnalysisResult) -> Vec<Section<'_>> {
    let payload = &result.analysis;
    let mut sections = Vec::new();

    if let Some(patient) = &payload.patient {
        sections.push(Section::Patient {
            patient,
            encounter: payload.encounter.as_ref(),
        });
    }
    if let Some(summary) = payload.summary.as_deref() {
        sections.push(Section::Summary(summary));
    }

    push_table(
        &mut sections,
        "Diagnoses",
        ["Name", "Status", "Severity", ""],
        &payload.diagnoses,
    );
    push_table(
        &mut sections,
        "Vital Signs",
        ["Vital", "Value", "Unit", "Flag"],
        &payload.vitals,
    );
    push_table(
        &mut sections,
        "Laboratory Results",
        ["Test", "Value", "Reference/Unit", "Flag"],
        &payload.labs,
    );

    push_list(&mut sections, "Procedures", &payload.procedures);
    push_list(&mut sections, "Imaging Findings", &payload.imaging_findings);
    push_list(&mut sections, "Red Flags", &payload.red_flags);
    push_list(&mut sections, "Key Findings", &payload.key_findings);
    push_list(&mut sections, "Recommendations", &payload.recommendations);

    push_table(
        &mut sections,
        "Follow-up Plan",
        ["Action", "Details", "Timeline", "Notes"],
        &payload.follow_up,
    );
    push_table(
        &mut sections,
        "Medications",
        ["Medication", "Dosage", "Frequency", "Notes"],
        &payload.medications,
    );

    if !payload.lifestyle.is_empty() {
        sections.push(Section::Lifestyle(&payload.lifestyle));
    }
    if let Some(disclaimer) = payload.disclaimer.as_deref() {
        sections.push(Section::Disclaimer(disclaimer));
    }

    sections.push(Section::ExtractedText(&result.extracted_text));
    sections.push(Section::Insights(&result.insights));

    sections
}

fn push_table<'a>(
    sections: &mut Vec<Section<'a>>,
    title: &'static str,
    headers: [&'static str; 4],
    rows: &'a [Row],
) {
    if !rows.is_empty() {
        sections.push(Section::Table {
            title,
            headers,
            rows,
        });
    }
}

fn push_list<'a>(sections: &mut Vec<Section<'a>>, title: &'static str, items: &'a [String]) {
    if !items.is_empty() {
        sections.push(Section::List { title, items });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrp_types::AnalysisPayload;

    fn document(payload: AnalysisPayload) -> AnalysisResult {
        AnalysisResult {
            filename: "report.pdf".into(),
            patient_id: None,
            extracted_text: "raw text".into(),
            analysis: payload,
            insights: vec![Insight {
                category: "General Health".into(),
                recommendation: "Follow up with your provider.".into(),
                priority: "Low".into(),
            }],
            context_used: false,
        }
    }

    fn titles(sections: &[Section<'_>]) -> Vec<String> {
        sections
            .iter()
            .map(|s| match s {
                Section::Patient { .. } => "patient".into(),
                Section::Summary(_) => "summary".into(),
                Section::Table { title, .. } => format!("table:{title}"),
                Section::List { title, .. } => format!("list:{title}"),
                Section::Lifestyle(_) => "lifestyle".into(),
                Section::Disclaimer(_) => "disclaimer".into(),
                Section::ExtractedText(_) => "extracted".into(),
                Section::Insights(_) => "insights".into(),
            })
            .collect()
    }

    #[test]
    fn empty_payload_yields_only_the_fixed_sections() {
        let doc = document(AnalysisPayload::default());
        let sections = build_sections(&doc);
        assert_eq!(titles(&sections), vec!["extracted", "insights"]);
    }

    #[test]
    fn summary_and_vitals_scenario() {
        // Summary plus one vitals row and an explicitly empty diagnoses
        // list: the summary block and the vitals table appear, the
        // diagnoses table does not.
        let payload = AnalysisPayload {
            summary: Some("Stable".into()),
            vitals: vec![Row {
                name: Some("HR".into()),
                value: Some("72".into()),
                unit: Some("bpm".into()),
                ..Row::default()
            }],
            ..AnalysisPayload::default()
        };
        let doc = document(payload);
        let sections = build_sections(&doc);
        assert_eq!(
            titles(&sections),
            vec!["summary", "table:Vital Signs", "extracted", "insights"]
        );
        let Section::Table { rows, .. } = &sections[1] else {
            panic!("expected vitals table");
        };
        assert_eq!(rows[0].display_value(), "72");
        assert_eq!(rows[0].display_unit(), "bpm");
    }

    #[test]
    fn full_payload_keeps_the_fixed_order() {
        let payload = AnalysisPayload {
            patient: Some(PatientInfo::default()),
            encounter: Some(EncounterInfo::default()),
            summary: Some("Summary".into()),
            disclaimer: Some("Not medical advice.".into()),
            diagnoses: vec![Row::default()],
            vitals: vec![Row::default()],
            labs: vec![Row::default()],
            follow_up: vec![Row::default()],
            medications: vec![Row::default()],
            procedures: vec!["Appendectomy".into()],
            imaging_findings: vec!["Clear chest X-ray".into()],
            red_flags: vec!["Chest pain".into()],
            key_findings: vec!["Anaemia".into()],
            recommendations: vec!["Hydrate".into()],
            lifestyle: vec![LifestyleEntry::default()],
        };
        let doc = document(payload);
        assert_eq!(
            titles(&build_sections(&doc)),
            vec![
                "patient",
                "summary",
                "table:Diagnoses",
                "table:Vital Signs",
                "table:Laboratory Results",
                "list:Procedures",
                "list:Imaging Findings",
                "list:Red Flags",
                "list:Key Findings",
                "list:Recommendations",
                "table:Follow-up Plan",
                "table:Medications",
                "lifestyle",
                "disclaimer",
                "extracted",
                "insights",
            ]
        );
    }

    #[test]
    fn encounter_without_patient_is_not_shown() {
        let payload = AnalysisPayload {
            encounter: Some(EncounterInfo {
                department: Some("Cardiology".into()),
                ..EncounterInfo::default()
            }),
            ..AnalysisPayload::default()
        };
        let doc = document(payload);
        assert_eq!(titles(&build_sections(&doc)), vec!["extracted", "insights"]);
    }

    #[test]
    fn empty_extracted_text_section_is_still_emitted() {
        let mut doc = document(AnalysisPayload::default());
        doc.extracted_text = String::new();
        let sections = build_sections(&doc);
        assert!(matches!(sections[0], Section::ExtractedText("")));
    }
}
