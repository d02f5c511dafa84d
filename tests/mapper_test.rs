//! Attribute mapper tests
//!
//! Tests for the rules that turn one disk record into metric emissions.

mod common;

use common::{attribute, nvme_disk, sata_disk};
use pysmart_exporter::collectors::{map_disk, MetricFilter};
use pysmart_exporter::error::ExporterError;
use pysmart_exporter::metrics::{MetricEmission, MetricKind, Sample};
use pysmart_exporter::smart::{AttributePayload, Diagnostics, TestRecord};

fn map_all(disk: &pysmart_exporter::smart::DiskRecord) -> Vec<MetricEmission> {
    map_disk(disk, &MetricFilter::default()).expect("mapping should succeed")
}

fn named<'a>(emissions: &'a [MetricEmission], name: &str) -> Vec<&'a MetricEmission> {
    emissions.iter().filter(|e| e.name == name).collect()
}

fn gauge(emission: &MetricEmission) -> f64 {
    match emission.sample {
        Sample::Gauge(v) => v,
        ref other => panic!("expected gauge, got {:?}", other),
    }
}

#[test]
fn test_info_is_emitted_first_with_all_identity_labels() {
    // Given: A SATA disk
    let disk = sata_disk("sda");

    // When: Mapping the disk
    let emissions = map_all(&disk);

    // Then: The first emission is the info metric carrying the identity as labels
    let info = &emissions[0];
    assert_eq!(info.name, "info");
    assert_eq!(info.kind(), MetricKind::Info);
    assert_eq!(info.labels.get("model"), Some(Some("WDC WD40EFRX-68N32N0")));
    assert_eq!(info.labels.get("rotation"), Some(Some("5400")));
    assert_eq!(info.labels.get("size"), Some(Some("4000787030016")));
    assert_eq!(info.labels.get("ssd"), Some(Some("False")));
    assert_eq!(info.labels.get("smart_enabled"), Some(Some("True")));
    assert_eq!(info.labels.get("device"), Some(Some("sda")));
    assert_eq!(info.labels.get("interface"), Some(Some("sat")));
    assert_eq!(info.labels.len(), 15);
}

#[test]
fn test_info_absent_fields_normalize_to_na() {
    // Given: A disk that reports almost nothing
    let mut disk = sata_disk("sdb");
    disk.vendor = None;
    disk.firmware = None;
    disk.rotation_rate = None;

    // When: Mapping and normalizing the info labels
    let emissions = map_all(&disk);
    let normalized = emissions[0].labels.normalized();

    // Then: Absent fields become N/A
    let value = |key: &str| {
        normalized
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(value("vendor"), Some("N/A"));
    assert_eq!(value("firmware"), Some("N/A"));
    assert_eq!(value("rotation"), Some("N/A"));
}

#[test]
fn test_assessment_pass_fail_and_absent() {
    let mut disk = sata_disk("sda");

    // PASS → 1
    let emissions = map_all(&disk);
    let passed = named(&emissions, "assessment_passed");
    assert_eq!(passed.len(), 1);
    assert_eq!(gauge(passed[0]), 1.0);

    // Anything else → 0
    disk.assessment = Some("FAIL".to_string());
    let emissions = map_all(&disk);
    assert_eq!(gauge(named(&emissions, "assessment_passed")[0]), 0.0);

    disk.assessment = Some("WARN".to_string());
    let emissions = map_all(&disk);
    assert_eq!(gauge(named(&emissions, "assessment_passed")[0]), 0.0);

    // Absent → nothing
    disk.assessment = None;
    let emissions = map_all(&disk);
    assert!(named(&emissions, "assessment_passed").is_empty());
}

#[test]
fn test_temperature_and_size_are_omitted_when_absent() {
    // Given: A disk without temperature or size
    let mut disk = sata_disk("sda");
    disk.temperature = None;
    disk.size = None;

    // When: Mapping the disk
    let emissions = map_all(&disk);

    // Then: Neither gauge is emitted
    assert!(named(&emissions, "temperature").is_empty());
    assert!(named(&emissions, "size").is_empty());
}

#[test]
fn test_temperature_uses_common_labels_only() {
    let disk = sata_disk("sda");

    let emissions = map_all(&disk);
    let temperature = named(&emissions, "temperature");

    assert_eq!(temperature.len(), 1);
    assert_eq!(gauge(temperature[0]), 34.0);
    assert_eq!(
        temperature[0].labels.keys().collect::<Vec<_>>(),
        vec!["device", "interface"]
    );
}

#[test]
fn test_megaraid_interface_adds_raid_id() {
    // Given: A disk behind a MegaRAID controller
    let mut disk = sata_disk("sda");
    disk.interface = "megaraid,3".to_string();

    // When: Mapping the disk
    let emissions = map_all(&disk);

    // Then: Every emission carries raid_id=3
    assert!(emissions
        .iter()
        .all(|e| e.labels.get("raid_id") == Some(Some("3"))));
}

#[test]
fn test_plain_interface_has_no_raid_id_except_state_set() {
    let disk = sata_disk("sda");

    let emissions = map_all(&disk);

    for emission in &emissions {
        if emission.kind() == MetricKind::StateSet {
            assert_eq!(emission.labels.get("raid_id"), Some(Some("N/A")));
        } else {
            assert_eq!(emission.labels.get("raid_id"), None, "{}", emission.name);
        }
    }
}

#[test]
fn test_legacy_attributes_emit_value_thresh_worst_and_raw() {
    // Given: A SATA disk with two attributes, one without raw value
    let mut disk = sata_disk("sda");
    disk.attributes = AttributePayload::Legacy(vec![
        attribute(5, "Reallocated_Sector_Ct", "200", Some(8)),
        attribute(9, "Power_On_Hours", "095", None),
    ]);

    // When: Mapping the disk
    let emissions = map_all(&disk);

    // Then: Both attributes get value/thresh/worst, only one gets raw
    assert_eq!(named(&emissions, "attribute_value").len(), 2);
    assert_eq!(named(&emissions, "attribute_thresh").len(), 2);
    assert_eq!(named(&emissions, "attribute_worst").len(), 2);
    let raw = named(&emissions, "attribute_raw");
    assert_eq!(raw.len(), 1);
    assert_eq!(gauge(raw[0]), 8.0);

    let power_on = named(&emissions, "attribute_value")[1];
    assert_eq!(gauge(power_on), 95.0);
    assert_eq!(power_on.labels.get("num"), Some(Some("9")));
    assert_eq!(power_on.labels.get("flags"), Some(Some("0x0033")));
    assert_eq!(power_on.labels.get("type"), Some(Some("Pre-fail")));
    assert_eq!(power_on.labels.get("updated"), Some(Some("Always")));
    assert_eq!(power_on.labels.get("whenfailed"), Some(Some("-")));
}

#[test]
fn test_nvme_attributes_only_emit_numeric_values() {
    // Given: An NVMe disk whose log contains an array entry
    let disk = nvme_disk("nvme0");

    // When: Mapping the disk
    let emissions = map_all(&disk);

    // Then: Only numeric entries become attribute_value, labelled by name
    let values = named(&emissions, "attribute_value");
    let names: Vec<_> = values
        .iter()
        .map(|e| e.labels.get("name").flatten().unwrap_or_default())
        .collect();
    assert_eq!(
        names,
        vec!["critical_warning", "data_units_read", "percentage_used"]
    );
    assert!(values.iter().all(|e| !e.labels.contains_key("num")));

    // And: Legacy-only families never appear
    assert!(named(&emissions, "attribute_thresh").is_empty());
    assert!(named(&emissions, "attribute_worst").is_empty());
    assert!(named(&emissions, "attribute_raw").is_empty());
}

#[test]
fn test_non_numeric_attribute_value_fails_the_disk() {
    // Given: An attribute whose threshold is printed as "---"
    let mut disk = sata_disk("sda");
    let mut broken = attribute(1, "Raw_Read_Error_Rate", "100", Some(0));
    broken.thresh = "---".to_string();
    disk.attributes = AttributePayload::Legacy(vec![broken]);

    // When: Mapping the disk
    let result = map_disk(&disk, &MetricFilter::default());

    // Then: The mapping fails with an attribute error naming the field
    match result {
        Err(ExporterError::AttributeValue {
            attribute, field, ..
        }) => {
            assert_eq!(attribute, "Raw_Read_Error_Rate");
            assert_eq!(field, "thresh");
        }
        other => panic!("expected attribute error, got {:?}", other),
    }
}

#[test]
fn test_diagnostics_missing_values_are_minus_one() {
    // Given: A disk with a single known diagnostic counter
    let mut disk = sata_disk("sda");
    disk.diagnostics = Diagnostics {
        Reallocated_Sector_Ct: Some(12),
        Reads_GB: Some(1024.5),
        ..Default::default()
    };

    // When: Mapping the disk
    let emissions = map_all(&disk);

    // Then: Every counter is present, unknown ones as -1
    let diagnostics: Vec<_> = emissions
        .iter()
        .filter(|e| e.name.starts_with("diagnostics_"))
        .collect();
    assert_eq!(diagnostics.len(), 17);

    let value = |name: &str| gauge(named(&emissions, name)[0]);
    assert_eq!(value("diagnostics_Reallocated_Sector_Ct"), 12.0);
    assert_eq!(value("diagnostics_Reads_GB"), 1024.5);
    assert_eq!(value("diagnostics_Load_Cycle_Count"), -1.0);
}

#[test]
fn test_test_capabilities_is_a_state_set() {
    let disk = sata_disk("sda");

    let emissions = map_all(&disk);
    let caps = named(&emissions, "test_capabilities");

    assert_eq!(caps.len(), 1);
    match &caps[0].sample {
        Sample::StateSet(states) => {
            assert_eq!(states.get("short"), Some(&true));
            assert_eq!(states.get("conveyance"), Some(&false));
        }
        other => panic!("expected state set, got {:?}", other),
    }
}

#[test]
fn test_self_test_optional_labels_only_when_present() {
    // Given: A SAS disk with one plain and one failed test entry
    let mut disk = sata_disk("sdc");
    disk.tests = vec![
        TestRecord {
            num: 1,
            hours: Some(5000),
            test_type: "Background long".to_string(),
            status: "Completed".to_string(),
            lba: Some("-".to_string()),
            ..Default::default()
        },
        TestRecord {
            num: 2,
            hours: Some(4000),
            test_type: "Background short".to_string(),
            status: "Failed in segment".to_string(),
            lba: Some("123456".to_string()),
            segment: Some("3".to_string()),
            sense: Some("3".to_string()),
            asc: Some("17".to_string()),
            ascq: Some("1".to_string()),
            ..Default::default()
        },
    ];

    // When: Mapping the disk
    let emissions = map_all(&disk);
    let tests = named(&emissions, "test");

    // Then: Each entry is a gauge of 1 and only the failed one has the extra labels
    assert_eq!(tests.len(), 2);
    assert!(tests.iter().all(|t| gauge(t) == 1.0));
    assert!(!tests[0].labels.contains_key("segment"));
    assert_eq!(tests[1].labels.get("segment"), Some(Some("3")));
    assert_eq!(tests[1].labels.get("ASC"), Some(Some("17")));
    assert_eq!(tests[1].labels.get("ASCQ"), Some(Some("1")));
    assert!(!tests[1].labels.contains_key("remain"));
    assert_eq!(tests[1].labels.get("hours"), Some(Some("4000")));
}

#[test]
fn test_metric_filter_keeps_info_and_listed_names() {
    // Given: A filter allowing only temperature and one attribute
    let disk = sata_disk("sda");
    let filter = MetricFilter::new(["temperature, Temperature_Celsius"]);

    // When: Mapping with the filter
    let emissions = map_disk(&disk, &filter).unwrap();

    // Then: Info is kept, plus the listed metric and attribute
    let names: Vec<_> = emissions.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "info",
            "temperature",
            "attribute_value",
            "attribute_thresh",
            "attribute_worst",
            "attribute_raw",
        ]
    );
    assert!(emissions[2..]
        .iter()
        .all(|e| e.labels.get("name") == Some(Some("Temperature_Celsius"))));
}

#[test]
fn test_metric_filter_matches_self_test_type() {
    let disk = sata_disk("sda");
    let filter = MetricFilter::new(["Short offline"]);

    let emissions = map_disk(&disk, &filter).unwrap();

    assert_eq!(named(&emissions, "test").len(), 1);
    assert!(named(&emissions, "test_capabilities").is_empty());
}
