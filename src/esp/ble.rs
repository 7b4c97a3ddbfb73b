// Activity Gauge — NimBLE Radio Roles
//
// Sensor side: GATT server + advertiser, brought up for one notification
// and torn down again before deep sleep. Display side: scanner/central
// that resolves the shared service, subscribes to the notify
// characteristic, and feeds decoded payloads into the mailbox.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use esp32_nimble::utilities::mutex::Mutex;
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{BLEAdvertisementData, BLECharacteristic, BLEClient, BLEDevice, NimbleProperties};
use esp_idf_hal::task::block_on;

use crate::config::{BLE_CHAR_UUID, BLE_SERVICE_UUID, DISPLAY_DEVICE_NAME, SENSOR_DEVICE_NAME};
use crate::link::{Connection, LinkError, SensorLink, Transmitter};
use crate::mailbox::PayloadMailbox;

fn ble_uuid(uuid: &str) -> Result<BleUuid, LinkError> {
    BleUuid::from_uuid128_string(uuid)
        .map_err(|e| LinkError::Radio(format!("bad uuid {}: {:?}", uuid, e)))
}

// ---------------------------------------------------------------------------
// Sensor role
// ---------------------------------------------------------------------------

pub struct NimbleTransmitter {
    characteristic: Option<Arc<Mutex<BLECharacteristic>>>,
}

impl NimbleTransmitter {
    pub fn new() -> Self {
        Self { characteristic: None }
    }
}

impl Default for NimbleTransmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter for NimbleTransmitter {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        let service_uuid = ble_uuid(BLE_SERVICE_UUID)?;
        let char_uuid = ble_uuid(BLE_CHAR_UUID)?;

        let device = BLEDevice::take();
        let server = device.get_server();
        server.on_connect(|_server, desc| {
            log::info!("Subscriber connected: {:?}", desc.address());
        });
        server.on_disconnect(|desc, _reason| {
            log::info!("Subscriber disconnected: {:?}", desc.address());
        });

        let service = server.create_service(service_uuid);
        let characteristic = service
            .lock()
            .create_characteristic(char_uuid, NimbleProperties::READ | NimbleProperties::NOTIFY);

        let advertising = device.get_advertising();
        advertising
            .lock()
            .set_data(
                BLEAdvertisementData::new()
                    .name(SENSOR_DEVICE_NAME)
                    .add_service_uuid(service_uuid),
            )
            .map_err(|e| LinkError::Radio(format!("advertisement data: {:?}", e)))?;
        advertising
            .lock()
            .start()
            .map_err(|e| LinkError::Radio(format!("advertising start: {:?}", e)))?;

        self.characteristic = Some(characteristic);
        Ok(())
    }

    fn subscriber_attached(&mut self) -> bool {
        BLEDevice::take().get_server().connected_count() > 0
    }

    fn notify(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        match self.characteristic.as_ref() {
            Some(characteristic) => {
                characteristic.lock().set_value(bytes).notify();
                Ok(())
            }
            None => Err(LinkError::Radio("notify before advertising".into())),
        }
    }

    fn shutdown(&mut self) {
        self.characteristic = None;
        // Full teardown: the radio must never be left running into deep
        // sleep. The next cycle's take() re-initialises the stack.
        if let Err(e) = BLEDevice::deinit() {
            log::warn!("BLE deinit failed: {:?}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Display role
// ---------------------------------------------------------------------------

pub struct NimbleConnection {
    client: BLEClient,
    alive: Arc<AtomicBool>,
}

impl Connection for NimbleConnection {
    fn is_connected(&self) -> bool {
        self.alive.load(Ordering::Acquire) && self.client.connected()
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.client.disconnect() {
            log::warn!("BLE disconnect failed: {:?}", e);
        }
    }
}

pub struct NimbleLink {
    mailbox: Arc<PayloadMailbox>,
}

impl NimbleLink {
    pub fn new(mailbox: Arc<PayloadMailbox>) -> Self {
        Self { mailbox }
    }
}

async fn subscribe_notifications(
    client: &mut BLEClient,
    service_uuid: BleUuid,
    char_uuid: BleUuid,
    mailbox: Arc<PayloadMailbox>,
) -> Result<(), LinkError> {
    let service = client
        .get_service(service_uuid)
        .await
        .map_err(|_| LinkError::ServiceMissing)?;
    let characteristic = service
        .get_characteristic(char_uuid)
        .await
        .map_err(|_| LinkError::ServiceMissing)?;

    if !characteristic.can_notify() {
        return Err(LinkError::NotifyUnsupported);
    }

    characteristic.on_notify(move |data| mailbox.post_encoded(data));
    characteristic
        .subscribe_notify(false)
        .await
        .map_err(|_| LinkError::SubscribeFailed)?;
    Ok(())
}

impl SensorLink for NimbleLink {
    type Connection = NimbleConnection;

    fn discover(&mut self, scan_window: Duration) -> Result<NimbleConnection, LinkError> {
        let service_uuid = ble_uuid(BLE_SERVICE_UUID)?;
        let char_uuid = ble_uuid(BLE_CHAR_UUID)?;
        let mailbox = Arc::clone(&self.mailbox);

        block_on(async move {
            let device = BLEDevice::take();
            // Name is diagnostic only; peers match on the service UUID.
            if let Err(e) = BLEDevice::set_device_name(DISPLAY_DEVICE_NAME) {
                log::warn!("Could not set device name: {:?}", e);
            }
            let scan = device.get_scan();
            let target = scan
                .active_scan(true)
                .interval(100)
                .window(99)
                .find_device(scan_window.as_millis() as i32, |adv| {
                    adv.is_advertising_service(&service_uuid)
                })
                .await
                .map_err(|e| LinkError::Radio(format!("scan: {:?}", e)))?
                .ok_or(LinkError::NotFound)?;

            let mut client = BLEClient::new();
            let alive = Arc::new(AtomicBool::new(true));
            let alive_cb = Arc::clone(&alive);
            client.on_disconnect(move |_| {
                log::warn!("BLE disconnected");
                alive_cb.store(false, Ordering::Release);
            });

            client
                .connect(target.addr())
                .await
                .map_err(|_| LinkError::ConnectFailed)?;

            if let Err(e) = subscribe_notifications(&mut client, service_uuid, char_uuid, mailbox).await {
                let _ = client.disconnect();
                return Err(e);
            }

            Ok(NimbleConnection { client, alive })
        })
    }
}
