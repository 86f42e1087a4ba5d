//! Typed decoding of `oc get machines -o json` output

use serde::Deserialize;

use crate::error::{PrunerError, PrunerResult};
use crate::models::MachineRecord;

#[derive(Debug, Deserialize)]
struct MachineList {
    #[serde(default)]
    items: Vec<MachineObject>,
}

#[derive(Debug, Deserialize)]
struct MachineObject {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    status: Option<MachineStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    name: Option<String>,
    creation_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MachineStatus {
    phase: Option<String>,
}

impl MachineObject {
    fn into_record(self) -> PrunerResult<MachineRecord> {
        let name = self.metadata.name.ok_or_else(|| {
            PrunerError::InvalidRecord("machine without metadata.name".to_string())
        })?;
        let created = self.metadata.creation_timestamp.ok_or_else(|| {
            PrunerError::InvalidRecord(format!(
                "machine {}: missing metadata.creationTimestamp",
                name
            ))
        })?;
        let phase = self.status.and_then(|s| s.phase).ok_or_else(|| {
            PrunerError::InvalidRecord(format!(
                "machine {}: missing status.phase, not reported yet; \
                 the next scheduled run will retry",
                name
            ))
        })?;

        MachineRecord::parse(&name, &created, &phase)
    }
}

/// Decode a machine list, failing on the first record that does not validate
pub fn decode_machine_list(raw: &[u8]) -> PrunerResult<Vec<MachineRecord>> {
    let list: MachineList = serde_json::from_slice(raw).map_err(|e| {
        PrunerError::InvalidRecord(format!("unparseable machine list: {}", e))
    })?;

    list.items.into_iter().map(MachineObject::into_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MachinePhase;
    use chrono::{TimeZone, Utc};

    const LIST: &str = r#"{
        "apiVersion": "v1",
        "kind": "List",
        "items": [
            {
                "apiVersion": "machine.openshift.io/v1beta1",
                "kind": "Machine",
                "metadata": {
                    "name": "cluster-x7k2p-worker-us-east-1a-8vdtq",
                    "namespace": "openshift-machine-api",
                    "creationTimestamp": "2024-05-20T10:15:00Z",
                    "labels": {
                        "machine.openshift.io/cluster-api-machine-role": "worker"
                    }
                },
                "spec": {},
                "status": { "phase": "Running", "nodeRef": { "name": "ip-10-0-1-5" } }
            },
            {
                "metadata": {
                    "name": "cluster-x7k2p-worker-us-east-1a-zq9lm",
                    "creationTimestamp": "2024-05-21T07:00:00Z"
                },
                "status": { "phase": "Deleting" }
            },
            {
                "metadata": {
                    "name": "cluster-x7k2p-worker-us-east-1b-4hd8s",
                    "creationTimestamp": "2024-05-31T23:59:59Z"
                },
                "status": { "phase": "Provisioned" }
            }
        ]
    }"#;

    #[test]
    fn test_decode_preserves_order_and_fields() {
        let machines = decode_machine_list(LIST.as_bytes()).unwrap();
        assert_eq!(machines.len(), 3);

        assert_eq!(machines[0].name, "cluster-x7k2p-worker-us-east-1a-8vdtq");
        assert_eq!(
            machines[0].created_at,
            Utc.with_ymd_and_hms(2024, 5, 20, 10, 15, 0).unwrap()
        );
        assert_eq!(machines[0].phase, MachinePhase::Running);
        assert_eq!(machines[1].phase, MachinePhase::Deleting);
        assert_eq!(
            machines[2].phase,
            MachinePhase::Other("Provisioned".to_string())
        );
    }

    #[test]
    fn test_decode_empty_list() {
        let machines = decode_machine_list(br#"{"items": []}"#).unwrap();
        assert!(machines.is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_machine_list(b"error: the server doesn't have a resource type");
        assert!(matches!(result, Err(PrunerError::InvalidRecord(_))));
    }

    #[test]
    fn test_decode_rejects_missing_phase() {
        let raw = br#"{"items": [{"metadata": {"name": "a", "creationTimestamp": "2024-05-20T10:15:00Z"}}]}"#;
        let err = decode_machine_list(raw).unwrap_err();
        assert!(matches!(err, PrunerError::InvalidRecord(_)));
        assert!(err.to_string().contains("status.phase"));
        assert!(err.to_string().contains("next scheduled run will retry"));
    }

    #[test]
    fn test_decode_rejects_missing_name() {
        let raw = br#"{"items": [{"metadata": {"creationTimestamp": "2024-05-20T10:15:00Z"}, "status": {"phase": "Running"}}]}"#;
        assert!(matches!(
            decode_machine_list(raw),
            Err(PrunerError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_one_bad_timestamp_fails_whole_list() {
        let raw = br#"{"items": [
            {"metadata": {"name": "a", "creationTimestamp": "2024-05-20T10:15:00Z"}, "status": {"phase": "Running"}},
            {"metadata": {"name": "b", "creationTimestamp": "2024-05-20T10:15:00.5Z"}, "status": {"phase": "Running"}}
        ]}"#;
        let err = decode_machine_list(raw).unwrap_err();
        assert!(err.to_string().contains("machine b"));
    }
}
