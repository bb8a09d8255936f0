//! HTML rendering for the patient form and the prediction result

use std::fmt::Write;

use crate::collector::{
    CountBounds, PatientForm, ADMISSION_SOURCE_IDS, ADMISSION_TYPE_IDS, AGE_BRACKETS,
    DISCHARGE_DISPOSITION_IDS, GENDERS, INSULIN_OPTIONS, NUMBER_DIAGNOSES, NUMBER_EMERGENCY,
    NUMBER_INPATIENT, NUMBER_OUTPATIENT, NUM_LAB_PROCEDURES, NUM_MEDICATIONS, NUM_PROCEDURES,
    RACES, TIME_IN_HOSPITAL, YES_NO,
};
use crate::presenter::PredictionView;
use crate::types::prediction::RiskTier;

const TITLE: &str = "Diabetes 30-Day Readmission Risk";

/// Form page, pre-filled with `form`
pub fn form_page(form: &PatientForm) -> String {
    layout(&form_section(form))
}

/// Form page followed by the verdict for the submitted values
pub fn result_page(form: &PatientForm, view: &PredictionView) -> String {
    let mut body = form_section(form);
    body.push_str(&result_section(view));
    layout(&body)
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>\n\
         body {{ font-family: sans-serif; max-width: 56rem; margin: 2rem auto; }}\n\
         .grid {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 0.75rem 1.5rem; }}\n\
         label {{ display: flex; flex-direction: column; font-size: 0.9rem; }}\n\
         .tier-high {{ background: #fdecea; color: #b71c1c; }}\n\
         .tier-medium {{ background: #fff8e1; color: #8d6e00; }}\n\
         .tier-low {{ background: #e8f5e9; color: #1b5e20; }}\n\
         .verdict {{ padding: 0.75rem 1rem; font-weight: bold; border-radius: 4px; }}\n\
         </style>\n</head>\n<body>\n<h1>{title}</h1>\n\
         <p>Enter patient encounter details to estimate readmission risk.</p>\n{body}</body>\n</html>\n",
        title = TITLE,
        body = body
    )
}

fn form_section(form: &PatientForm) -> String {
    let mut html = String::from("<form method=\"post\" action=\"/predict\">\n<div class=\"grid\">\n");

    select(&mut html, "age", "Age group", &AGE_BRACKETS, &form.age);
    select(&mut html, "gender", "Gender", &GENDERS, &form.gender);
    select(&mut html, "race", "Race", &RACES, &form.race);
    number(&mut html, TIME_IN_HOSPITAL, form.time_in_hospital);
    number(&mut html, NUMBER_DIAGNOSES, form.number_diagnoses);
    select_id(&mut html, "admission_type_id", "Admission type ID", &ADMISSION_TYPE_IDS, form.admission_type_id);
    select_id(
        &mut html,
        "discharge_disposition_id",
        "Discharge disposition ID",
        &DISCHARGE_DISPOSITION_IDS,
        form.discharge_disposition_id,
    );
    select_id(
        &mut html,
        "admission_source_id",
        "Admission source ID",
        &ADMISSION_SOURCE_IDS,
        form.admission_source_id,
    );
    number(&mut html, NUM_LAB_PROCEDURES, form.num_lab_procedures);
    number(&mut html, NUM_MEDICATIONS, form.num_medications);
    select(&mut html, "insulin", "Insulin", &INSULIN_OPTIONS, &form.insulin);
    select(&mut html, "medication_change", "Medication change", &YES_NO, &form.medication_change);
    select(&mut html, "diabetesMed", "On diabetes medication", &YES_NO, &form.diabetes_med);
    number(&mut html, NUM_PROCEDURES, form.num_procedures);
    number(&mut html, NUMBER_OUTPATIENT, form.number_outpatient);
    number(&mut html, NUMBER_EMERGENCY, form.number_emergency);
    number(&mut html, NUMBER_INPATIENT, form.number_inpatient);

    html.push_str("</div>\n<p><button type=\"submit\">Predict Readmission Risk</button></p>\n</form>\n");
    html
}

fn result_section(view: &PredictionView) -> String {
    let class = match view.risk_tier {
        RiskTier::High => "tier-high",
        RiskTier::Medium => "tier-medium",
        RiskTier::Low => "tier-low",
    };
    format!(
        "<section id=\"result\">\n<h2>Prediction</h2>\n<p>{summary}</p>\n\
         <p>Predicted label: {label}</p>\n\
         <p class=\"verdict {class}\">{tier}</p>\n<p><small>{disclaimer}</small></p>\n</section>\n",
        summary = escape(&view.summary),
        label = view.predicted_label,
        class = class,
        tier = escape(&view.risk_label),
        disclaimer = escape(&view.disclaimer),
    )
}

fn select(html: &mut String, name: &str, label: &str, options: &[&str], selected: &str) {
    let _ = writeln!(html, "<label>{}<select name=\"{}\">", escape(label), name);
    for option in options {
        let mark = if *option == selected { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{v}\"{mark}>{v}</option>",
            v = escape(option),
            mark = mark
        );
    }
    html.push_str("</select></label>\n");
}

fn select_id(html: &mut String, name: &str, label: &str, options: &[i64], selected: i64) {
    let _ = writeln!(html, "<label>{}<select name=\"{}\">", escape(label), name);
    for option in options {
        let mark = if *option == selected { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{v}\"{mark}>{v}</option>", v = option, mark = mark);
    }
    html.push_str("</select></label>\n");
}

fn number(html: &mut String, bounds: CountBounds, value: i64) {
    let _ = writeln!(
        html,
        "<label>{label}<input type=\"number\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"1\" value=\"{value}\"></label>",
        label = escape(bounds.label),
        name = bounds.field,
        min = bounds.min,
        max = bounds.max,
        value = value,
    );
}

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
