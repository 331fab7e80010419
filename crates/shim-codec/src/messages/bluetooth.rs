// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::wire_message;

wire_message! {
    pub struct BluetoothStackConfiguration {
        pub device_name: String,
        pub max_connections: u8,
        pub mtu: u16,
        pub appearance: u16,
    }
}

wire_message! {
    pub struct GattDescriptorDefinition {
        pub uuid: [u8; 16],
        pub permissions: u8,
        pub initial_value: Vec<u8>,
    }
}

wire_message! {
    pub struct GattCharacteristicDefinition {
        pub uuid: [u8; 16],
        pub properties: u8,
        pub permissions: u8,
        pub max_length: u16,
        pub initial_value: Vec<u8>,
        pub descriptors: Vec<GattDescriptorDefinition>,
    }
}

wire_message! {
    pub struct GattServiceDefinition {
        pub uuid: [u8; 16],
        pub primary: bool,
        pub characteristics: Vec<GattCharacteristicDefinition>,
    }
}

wire_message! {
    /// Complete GATT server sent with [`crate::BluetoothFunction::DefineGattServer`].
    /// The co-processor answers with a [`BluetoothHandleTable`].
    pub struct GattServerDefinition {
        pub device_name: String,
        pub services: Vec<GattServiceDefinition>,
    }
}

wire_message! {
    pub struct BluetoothHandleEntry {
        pub uuid: [u8; 16],
        pub handle: u16,
    }
}

wire_message! {
    /// Attribute handles assigned by the co-processor, in definition order.
    pub struct BluetoothHandleTable {
        pub entries: Vec<BluetoothHandleEntry>,
    }
}

wire_message! {
    pub struct BluetoothDataWriteRequest {
        pub handle: u16,
        pub notify: bool,
        pub data: Vec<u8>,
    }
}

wire_message! {
    pub struct BluetoothDataReceivedEvent {
        pub connection_id: u16,
        pub handle: u16,
        pub data: Vec<u8>,
    }
}

wire_message! {
    pub struct BluetoothConnectionEvent {
        pub connection_id: u16,
        pub address: [u8; 6],
        pub connected: bool,
    }
}

wire_message! {
    pub struct BluetoothAdvertisingRequest {
        pub interval_ms: u16,
        pub connectable: bool,
        pub advertising_data: Vec<u8>,
        pub scan_response_data: Vec<u8>,
    }
}

impl BluetoothHandleTable {
    pub fn handle_for(&self, uuid: &[u8; 16]) -> Option<u16> {
        self.entries
            .iter()
            .find(|entry| &entry.uuid == uuid)
            .map(|entry| entry.handle)
    }
}
