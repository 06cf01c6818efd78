// libs/document-cell/src/services/generator.rs
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{
    DocumentError, DocumentParties, GeneratedDocument, MedicalCertificateDocument,
    PathologyReferralDocument, PrescriptionDocument,
};

const DOCUMENT_HEADER: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>FreeDoc Medical Document</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background: white; }
        .header { border-bottom: 3px solid #2563eb; padding-bottom: 20px; margin-bottom: 30px; }
        .logo-text { font-size: 32px; font-weight: bold; color: #2563eb; }
        .document-title { font-size: 24px; font-weight: bold; color: #1f2937; margin-bottom: 20px; text-align: center; }
        .section { margin-bottom: 20px; padding: 15px; border: 1px solid #e5e7eb; border-radius: 8px; }
        .section h3 { margin-top: 0; color: #374151; border-bottom: 1px solid #e5e7eb; padding-bottom: 8px; }
        .field { margin: 10px 0; }
        .field label { font-weight: bold; color: #374151; display: inline-block; width: 150px; }
        .signature-section { margin-top: 40px; border-top: 2px solid #e5e7eb; padding-top: 20px; }
        .footer { margin-top: 40px; text-align: center; font-size: 12px; color: #6b7280; border-top: 1px solid #e5e7eb; padding-top: 20px; }
    </style>
</head>
<body>
    <div class="header">
        <span class="logo-text">freedoc</span>
        <div>Free Healthcare for All Australians — support@freedoc.com.au</div>
    </div>
"#;

const DOCUMENT_FOOTER: &str = r#"    <div class="footer">
        <p><strong>FreeDoc</strong> - Providing free healthcare services to all Australians</p>
        <p>This document was generated electronically and is valid without signature.</p>
    </div>
</body>
</html>
"#;

/// Renders consultation outcome documents as HTML and writes them under the
/// configured documents directory.
pub struct DocumentGenerator {
    documents_dir: PathBuf,
}

impl DocumentGenerator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            documents_dir: PathBuf::from(&config.documents_dir),
        }
    }

    pub fn with_dir(documents_dir: PathBuf) -> Self {
        Self { documents_dir }
    }

    pub fn generate_prescription(
        &self,
        data: &PrescriptionDocument,
    ) -> Result<GeneratedDocument, DocumentError> {
        require(&data.medication_name, "medication_name")?;
        require(&data.dosage, "dosage")?;
        require(&data.instructions, "instructions")?;

        let html = format!(
            r#"{header}    <div class="document-title">PRESCRIPTION</div>

    {patient_section}

    <div class="section">
        <h3>Prescribed Medication</h3>
        <div class="field"><label>Medication:</label> <span>{medication}</span></div>
        <div class="field"><label>Dosage:</label> <span>{dosage}</span></div>
        <div class="field"><label>Quantity:</label> <span>{quantity}</span></div>
        <div class="field"><label>Repeats:</label> <span>{repeats}</span></div>
        <div class="field"><label>Instructions:</label> <span>{instructions}</span></div>
    </div>

    {signature_section}
{footer}"#,
            header = DOCUMENT_HEADER,
            patient_section = patient_section(&data.parties),
            medication = data.medication_name,
            dosage = data.dosage,
            quantity = data.quantity,
            repeats = data.repeats,
            instructions = data.instructions,
            signature_section = signature_section(&data.parties, "Prescribing Doctor"),
            footer = DOCUMENT_FOOTER,
        );

        self.save(html, "prescription", data.parties.consultation_id)
    }

    pub fn generate_medical_certificate(
        &self,
        data: &MedicalCertificateDocument,
    ) -> Result<GeneratedDocument, DocumentError> {
        require(&data.certificate_type, "certificate_type")?;
        require(&data.date_from, "date_from")?;
        require(&data.date_to, "date_to")?;
        require(&data.condition, "condition")?;

        let html = format!(
            r#"{header}    <div class="document-title">MEDICAL CERTIFICATE</div>

    {patient_section}

    <div class="section">
        <h3>Medical Certification</h3>
        <div class="field"><label>Certificate Type:</label> <span>{certificate_type}</span></div>
        <div class="field"><label>Valid From:</label> <span>{date_from}</span></div>
        <div class="field"><label>Valid To:</label> <span>{date_to}</span></div>
        <div class="field"><label>Medical Condition:</label> <span>{condition}</span></div>
    </div>

    {signature_section}
{footer}"#,
            header = DOCUMENT_HEADER,
            patient_section = patient_section(&data.parties),
            certificate_type = data.certificate_type,
            date_from = data.date_from,
            date_to = data.date_to,
            condition = data.condition,
            signature_section = signature_section(&data.parties, "Attending Doctor"),
            footer = DOCUMENT_FOOTER,
        );

        self.save(html, "medical_certificate", data.parties.consultation_id)
    }

    pub fn generate_pathology_referral(
        &self,
        data: &PathologyReferralDocument,
    ) -> Result<GeneratedDocument, DocumentError> {
        if data.tests_requested.iter().all(|t| t.trim().is_empty()) {
            return Err(DocumentError::MissingField("tests_requested"));
        }
        require(&data.clinical_details, "clinical_details")?;

        let tests_list: String = data
            .tests_requested
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("        <li>{}</li>\n", t))
            .collect();

        let preferred_lab = data
            .preferred_lab
            .as_ref()
            .map(|lab| {
                format!(
                    r#"<div class="field"><label>Preferred Laboratory:</label> <span>{}</span></div>"#,
                    lab
                )
            })
            .unwrap_or_default();

        let html = format!(
            r#"{header}    <div class="document-title">PATHOLOGY REFERRAL</div>

    {patient_section}

    <div class="section">
        <h3>Tests Requested</h3>
        <ul>
{tests_list}        </ul>
        <div class="field"><label>Urgency:</label> <span>{urgency}</span></div>
        {preferred_lab}
    </div>

    <div class="section">
        <h3>Clinical Details</h3>
        <div>{clinical_details}</div>
    </div>

    {signature_section}
{footer}"#,
            header = DOCUMENT_HEADER,
            patient_section = patient_section(&data.parties),
            tests_list = tests_list,
            urgency = data.urgency.to_uppercase(),
            preferred_lab = preferred_lab,
            clinical_details = data.clinical_details,
            signature_section = signature_section(&data.parties, "Referring Doctor"),
            footer = DOCUMENT_FOOTER,
        );

        self.save(html, "pathology_referral", data.parties.consultation_id)
    }

    fn save(
        &self,
        html: String,
        kind: &str,
        consultation_id: uuid::Uuid,
    ) -> Result<GeneratedDocument, DocumentError> {
        let file_name = format!("{}_{}_{}.html", kind, consultation_id, Utc::now().timestamp_millis());

        fs::create_dir_all(&self.documents_dir)?;
        let path = self.documents_dir.join(&file_name);
        fs::write(&path, &html)?;

        info!("Generated {} document at {}", kind, path.display());

        Ok(GeneratedDocument {
            file_name,
            path: path.to_string_lossy().into_owned(),
            html,
        })
    }
}

fn require(value: &str, field: &'static str) -> Result<(), DocumentError> {
    if value.trim().is_empty() {
        debug!("Document generation rejected, missing field: {}", field);
        return Err(DocumentError::MissingField(field));
    }
    Ok(())
}

fn patient_section(parties: &DocumentParties) -> String {
    format!(
        r#"<div class="section">
        <h3>Patient Information</h3>
        <div class="field"><label>Full Name:</label> <span>{}</span></div>
        <div class="field"><label>Date of Birth:</label> <span>{}</span></div>
    </div>"#,
        parties.patient_name,
        if parties.patient_date_of_birth.is_empty() {
            "Not provided"
        } else {
            &parties.patient_date_of_birth
        },
    )
}

fn signature_section(parties: &DocumentParties, doctor_label: &str) -> String {
    format!(
        r#"<div class="signature-section">
        <div class="field"><label>{}:</label> <span>{}</span></div>
        <div class="field"><label>Medical Registration:</label> <span>{}</span></div>
        <div class="field"><label>Date Issued:</label> <span>{}</span></div>
        <div class="field"><label>Consultation:</label> <span>{}</span></div>
    </div>"#,
        doctor_label,
        parties.doctor_name,
        parties.doctor_license,
        parties.issued_date,
        parties.consultation_id,
    )
}
