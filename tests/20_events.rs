mod common;

use anyhow::Result;
use guest_checkin::client::ClientError;
use guest_checkin::types::{EventPatch, NewEvent, NewGuest};
use uuid::Uuid;

#[tokio::test]
async fn event_lifecycle() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::ready_client(server, common::ORGANIZER).await?;

    let event = client
        .create_event(&NewEvent {
            name: "  Launch party ".to_string(),
            location: Some("Rooftop".to_string()),
            starts_at: None,
        })
        .await?;
    assert_eq!(event.name, "Launch party");

    let events = client.list_events().await?;
    assert!(events.iter().any(|e| e.id == event.id));

    let updated = client
        .update_event(
            event.id,
            &EventPatch {
                location: Some(String::new()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.location, None);
    assert_eq!(updated.name, "Launch party");

    client.delete_event(event.id).await?;
    let err = client.get_event(event.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn invalid_events_and_unknown_ids() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::ready_client(server, common::ORGANIZER).await?;

    let err = client
        .create_event(&NewEvent {
            name: "   ".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    let err = client.delete_event(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn organizers_cannot_see_each_others_events() -> Result<()> {
    let server = common::ensure_server().await?;
    let owner = common::ready_client(server, common::ORGANIZER).await?;
    let other = common::ready_client(server, common::OTHER_ORGANIZER).await?;

    let event = owner
        .create_event(&NewEvent {
            name: "Private dinner".to_string(),
            ..Default::default()
        })
        .await?;

    assert_eq!(other.get_event(event.id).await.unwrap_err().status(), Some(404));
    assert!(!other.list_events().await?.iter().any(|e| e.id == event.id));
    assert_eq!(other.list_guests(event.id).await.unwrap_err().status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn guests_check_in_exactly_once() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = common::ready_client(server, common::ORGANIZER).await?;

    let event = client
        .create_event(&NewEvent {
            name: "Gala".to_string(),
            ..Default::default()
        })
        .await?;
    let guest = client
        .add_guest(
            event.id,
            &NewGuest {
                name: "Ada".to_string(),
                email: Some("ada@example.com".to_string()),
            },
        )
        .await?;
    assert!(!guest.is_checked_in());

    let admitted = client.scan(&format!("checkin:{}", guest.id)).await?;
    assert!(admitted.is_checked_in());

    let err = client.check_in(guest.id).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 409, .. }));

    let err = client.scan("checkin:not-a-uuid").await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    let guests = client.list_guests(event.id).await?;
    assert_eq!(guests.len(), 1);
    assert!(guests[0].is_checked_in());

    client.remove_guest(guest.id).await?;
    assert!(client.list_guests(event.id).await?.is_empty());
    Ok(())
}
