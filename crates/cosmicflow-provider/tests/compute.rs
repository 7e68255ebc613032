//! Disks, NICs, secondary addresses and affinity groups

mod common;

use common::{FakeApi, GIB, VM_ID, provider};
use cosmicflow_cloud::{ApiError, CloudError};
use cosmicflow_provider::ResourceKind;
use cosmicflow_provider::resources::{DiskResource, NicResource, SecondaryIpAddressResource};
use serde_json::{Value, json};

fn disk(attach: bool) -> Value {
    json!({
        "name": "data",
        "disk_offering": "Small",
        "size": 10,
        "attach": attach,
        "virtual_machine_id": VM_ID,
    })
}

fn busy() -> ApiError {
    ApiError::remote(530, "VM is busy with another job")
}

fn disk_calls(api: &FakeApi) -> Vec<String> {
    const RELEVANT: [&str; 5] = [
        "stop_vm",
        "detach_volume",
        "start_vm",
        "attach_volume",
        "delete_volume",
    ];
    api.calls()
        .into_iter()
        .filter(|c| RELEVANT.contains(&c.as_str()))
        .collect()
}

#[tokio::test]
async fn test_disk_create_and_attach() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let result = provider.create(ResourceKind::Disk, disk(true)).await;
    assert!(result.is_success(), "{:?}", result.error);

    let state: DiskResource = serde_json::from_value(result.state.unwrap()).unwrap();
    assert!(state.attach);
    assert_eq!(state.device_id, Some(1));
    assert_eq!(state.size, Some(10));
    assert_eq!(state.disk_offering, "Small");
    assert_eq!(state.disk_controller.as_deref(), Some("SCSI"));
    assert_eq!(state.zone.as_deref(), Some("zone-a"));

    let volume = api.state.lock().unwrap().volumes[&state.id].clone();
    assert_eq!(volume.virtual_machine_id, VM_ID);
    assert_eq!(volume.size, 10 * GIB);
}

#[tokio::test]
async fn test_disk_attach_outlasts_a_busy_machine() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());
    api.fail_times("attach_volume", 5, busy());

    let result = provider.create(ResourceKind::Disk, disk(true)).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.state.unwrap()["attach"], true);
    assert_eq!(api.count("attach_volume"), 6);
}

#[tokio::test]
async fn test_disk_attach_gives_up_after_ten_attempts() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());
    api.fail_times("attach_volume", 20, busy());

    let result = provider.create(ResourceKind::Disk, disk(true)).await;
    assert!(result.error.unwrap().to_string().contains("attaching disk data"));
    assert_eq!(api.count("attach_volume"), 10);

    // The volume exists, so its id is kept
    let state = result.state.unwrap();
    assert!(api.state.lock().unwrap().volumes.contains_key(state["id"].as_str().unwrap()));
}

#[tokio::test]
async fn test_disk_detached_when_attach_is_turned_off() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let prior = provider.create(ResourceKind::Disk, disk(true)).await.state.unwrap();
    let result = provider.update(ResourceKind::Disk, prior, disk(false)).await;
    assert!(result.is_success(), "{:?}", result.error);

    let state: DiskResource = serde_json::from_value(result.state.unwrap()).unwrap();
    assert!(!state.attach);
    assert!(!api.state.lock().unwrap().volumes[&state.id].is_attached());
    assert_eq!(api.count("detach_volume"), 1);
}

#[tokio::test]
async fn test_disk_unchanged_update_touches_nothing() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let prior = provider.create(ResourceKind::Disk, disk(true)).await.state.unwrap();
    let before = api.mutations();

    let result = provider.update(ResourceKind::Disk, prior.clone(), disk(true)).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.state.unwrap(), prior);
    assert_eq!(api.mutations(), before);
}

#[tokio::test]
async fn test_disk_resize_replaces_the_id() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let prior = provider.create(ResourceKind::Disk, disk(false)).await.state.unwrap();
    let mut desired = disk(false);
    desired["size"] = json!(20);
    desired["disk_offering"] = json!("Large");

    let result = provider.update(ResourceKind::Disk, prior.clone(), desired).await;
    assert!(result.is_success(), "{:?}", result.error);

    let state = result.state.unwrap();
    assert_ne!(state["id"], prior["id"]);
    assert_eq!(state["size"], 20);
    assert_eq!(state["disk_offering"], "Large");
    assert_eq!(api.count("resize_volume"), 1);
}

#[tokio::test]
async fn test_disk_offering_case_change_is_not_a_resize() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let prior = provider.create(ResourceKind::Disk, disk(false)).await.state.unwrap();
    let mut desired = disk(false);
    desired["disk_offering"] = json!("SMALL");

    let result = provider.update(ResourceKind::Disk, prior, desired).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(api.count("resize_volume"), 0);
}

#[tokio::test]
async fn test_disk_shrink_needs_consent() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let prior = provider.create(ResourceKind::Disk, disk(false)).await.state.unwrap();
    let mut desired = disk(false);
    desired["size"] = json!(5);

    let result = provider.update(ResourceKind::Disk, prior.clone(), desired.clone()).await;
    assert!(result.error.unwrap().to_string().contains("shrink"));
    assert_eq!(result.state.unwrap()["id"], prior["id"]);

    desired["shrink_ok"] = json!(true);
    let result = provider.update(ResourceKind::Disk, prior, desired).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.state.unwrap()["size"], 5);
}

#[tokio::test]
async fn test_disk_delete_detaches_first() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let state = provider.create(ResourceKind::Disk, disk(true)).await.state.unwrap();
    let result = provider.delete(ResourceKind::Disk, state.clone()).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert!(result.state.is_none());
    assert!(api.state.lock().unwrap().volumes.is_empty());

    assert_eq!(disk_calls(&api), ["attach_volume", "detach_volume", "delete_volume"]);

    let again = provider.delete(ResourceKind::Disk, state).await;
    assert!(again.is_success(), "{:?}", again.error);
}

#[tokio::test]
async fn test_disk_detach_stops_a_refusing_machine() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let state = provider.create(ResourceKind::Disk, disk(true)).await.state.unwrap();
    api.fail_times("detach_volume", 1, ApiError::remote(530, "hot unplug is not supported"));

    let result = provider.delete(ResourceKind::Disk, state).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(
        disk_calls(&api),
        ["attach_volume", "detach_volume", "stop_vm", "detach_volume", "start_vm", "delete_volume"]
    );
}

#[tokio::test]
async fn test_disk_controller_is_validated() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let mut attrs = disk(false);
    attrs["disk_controller"] = json!("NVME");
    let result = provider.create(ResourceKind::Disk, attrs).await;

    assert!(result.error.unwrap().is_validation());
    assert!(result.state.is_none());
    assert_eq!(api.mutations(), 0);
}

#[tokio::test]
async fn test_nic_add_outlasts_a_busy_machine() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());
    api.fail_times("add_nic_to_vm", 4, busy());

    let result = provider
        .create(
            ResourceKind::Nic,
            json!({ "network_id": "net-2", "virtual_machine_id": VM_ID }),
        )
        .await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(api.count("add_nic_to_vm"), 5);

    let state: NicResource = serde_json::from_value(result.state.unwrap()).unwrap();
    assert_eq!(state.network_id, "net-2");
    assert_eq!(state.ip_address.as_deref(), Some("10.2.0.5"));
    assert_eq!(api.state.lock().unwrap().vms[VM_ID].nic.len(), 2);
}

#[tokio::test]
async fn test_nic_delete_and_read_after_removal() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let state = provider
        .create(
            ResourceKind::Nic,
            json!({ "network_id": "net-2", "ip_address": "10.2.0.9", "virtual_machine_id": VM_ID }),
        )
        .await
        .state
        .unwrap();
    assert_eq!(state["ip_address"], "10.2.0.9");

    let result = provider.delete(ResourceKind::Nic, state.clone()).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(api.state.lock().unwrap().vms[VM_ID].nic.len(), 1);

    let read = provider.read(ResourceKind::Nic, state.clone()).await;
    assert!(read.is_success());
    assert!(read.state.is_none());

    let again = provider.delete(ResourceKind::Nic, state).await;
    assert!(again.is_success(), "{:?}", again.error);
}

#[tokio::test]
async fn test_secondary_ip_defaults_to_first_nic() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let result = provider
        .create(ResourceKind::SecondaryIpAddress, json!({ "virtual_machine_id": VM_ID }))
        .await;
    assert!(result.is_success(), "{:?}", result.error);

    let state: SecondaryIpAddressResource = serde_json::from_value(result.state.unwrap()).unwrap();
    assert_eq!(state.nic_id.as_deref(), Some("nic-1"));
    assert_eq!(state.ip_address.as_deref(), Some("10.0.0.50"));

    let deleted = provider
        .delete(ResourceKind::SecondaryIpAddress, serde_json::to_value(&state).unwrap())
        .await;
    assert!(deleted.is_success(), "{:?}", deleted.error);
    let ips = api.state.lock().unwrap().vms[VM_ID].nic[0].secondary_ips.clone();
    assert!(ips.iter().all(|ip| ip.id != state.id));
}

#[tokio::test]
async fn test_secondary_ip_read_of_removed_address_is_gone() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let result = provider
        .read(
            ResourceKind::SecondaryIpAddress,
            json!({ "id": "sip-404", "nic_id": "nic-1", "virtual_machine_id": VM_ID }),
        )
        .await;
    assert!(result.is_success(), "{:?}", result.error);
    assert!(result.state.is_none());
}

#[tokio::test]
async fn test_secondary_ip_import() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let state = provider.import_secondary_ip_address("vm-1/10.0.0.11").await.unwrap();
    assert_eq!(state["id"], "sip-1");
    assert_eq!(state["nic_id"], "nic-1");
    assert_eq!(state["virtual_machine_id"], VM_ID);

    let err = provider.import_secondary_ip_address("vm-1").await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidConfig(_)));
    assert!(err.to_string().contains("invalid variable import format"));

    let err = provider.import_secondary_ip_address("vm-1/10.9.9.9").await.unwrap_err();
    assert!(matches!(err, CloudError::ResourceNotFound(_)));

    let err = provider.import_secondary_ip_address("vm-9/10.0.0.11").await.unwrap_err();
    assert!(matches!(err, CloudError::ResourceNotFound(_)));
}

#[tokio::test]
async fn test_affinity_group_description_defaults_to_name() {
    let api = FakeApi::seeded();
    let provider = provider(api.clone());

    let state = provider
        .create(
            ResourceKind::AffinityGroup,
            json!({ "name": "spread", "type": "host anti-affinity" }),
        )
        .await
        .state
        .unwrap();
    assert_eq!(state["description"], "spread");
    assert_eq!(state["type"], "host anti-affinity");

    let result = provider.delete(ResourceKind::AffinityGroup, state.clone()).await;
    assert!(result.is_success(), "{:?}", result.error);
    let read = provider.read(ResourceKind::AffinityGroup, state).await;
    assert!(read.state.is_none());
}
