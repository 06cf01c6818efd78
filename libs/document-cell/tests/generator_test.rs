use uuid::Uuid;

use document_cell::models::{
    DocumentError, DocumentParties, MedicalCertificateDocument, PathologyReferralDocument,
    PrescriptionDocument,
};
use document_cell::DocumentGenerator;

fn parties() -> DocumentParties {
    DocumentParties {
        consultation_id: Uuid::new_v4(),
        patient_name: "Alex Patient".to_string(),
        patient_date_of_birth: "1990-04-02".to_string(),
        doctor_name: "Dr Jane Citizen".to_string(),
        doctor_license: "MED-0001".to_string(),
        issued_date: "25/08/2026".to_string(),
    }
}

fn generator(dir: &tempfile::TempDir) -> DocumentGenerator {
    DocumentGenerator::with_dir(dir.path().to_path_buf())
}

#[test]
fn test_prescription_renders_and_writes_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = PrescriptionDocument {
        parties: parties(),
        medication_name: "Paracetamol".to_string(),
        dosage: "500mg".to_string(),
        quantity: "30".to_string(),
        repeats: 0,
        instructions: "Take with food".to_string(),
    };

    let doc = generator(&dir)
        .generate_prescription(&data)
        .expect("generation should succeed");

    assert!(doc.html.contains("PRESCRIPTION"));
    assert!(doc.html.contains("Paracetamol"));
    assert!(doc.html.contains("Dr Jane Citizen"));
    assert!(doc.file_name.starts_with("prescription_"));

    let written = std::fs::read_to_string(&doc.path).expect("file exists");
    assert_eq!(written, doc.html);
}

#[test]
fn test_prescription_missing_medication_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = PrescriptionDocument {
        parties: parties(),
        medication_name: "  ".to_string(),
        dosage: "500mg".to_string(),
        quantity: "30".to_string(),
        repeats: 0,
        instructions: "Take with food".to_string(),
    };

    let err = generator(&dir).generate_prescription(&data).unwrap_err();
    assert!(matches!(err, DocumentError::MissingField("medication_name")));

    // Nothing should be written on validation failure.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_certificate_missing_date_range_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = MedicalCertificateDocument {
        parties: parties(),
        certificate_type: "sick_leave".to_string(),
        date_from: String::new(),
        date_to: "2026-08-28".to_string(),
        condition: "Influenza".to_string(),
    };

    let err = generator(&dir).generate_medical_certificate(&data).unwrap_err();
    assert!(matches!(err, DocumentError::MissingField("date_from")));
}

#[test]
fn test_certificate_renders_all_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = MedicalCertificateDocument {
        parties: parties(),
        certificate_type: "sick_leave".to_string(),
        date_from: "2026-08-25".to_string(),
        date_to: "2026-08-28".to_string(),
        condition: "Influenza".to_string(),
    };

    let doc = generator(&dir)
        .generate_medical_certificate(&data)
        .expect("generation should succeed");

    assert!(doc.html.contains("MEDICAL CERTIFICATE"));
    assert!(doc.html.contains("2026-08-25"));
    assert!(doc.html.contains("Influenza"));
}

#[test]
fn test_pathology_referral_lists_tests_and_urgency() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = PathologyReferralDocument {
        parties: parties(),
        tests_requested: vec!["blood_work".to_string(), "cholesterol".to_string()],
        clinical_details: "Fatigue, family history".to_string(),
        urgency: "routine".to_string(),
        preferred_lab: None,
    };

    let doc = generator(&dir)
        .generate_pathology_referral(&data)
        .expect("generation should succeed");

    assert!(doc.html.contains("PATHOLOGY REFERRAL"));
    assert!(doc.html.contains("blood_work"));
    assert!(doc.html.contains("ROUTINE"));
}

#[test]
fn test_pathology_referral_requires_tests() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = PathologyReferralDocument {
        parties: parties(),
        tests_requested: vec![String::new()],
        clinical_details: "Fatigue".to_string(),
        urgency: "routine".to_string(),
        preferred_lab: None,
    };

    let err = generator(&dir).generate_pathology_referral(&data).unwrap_err();
    assert!(matches!(err, DocumentError::MissingField("tests_requested")));
}
