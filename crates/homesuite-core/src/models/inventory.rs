//! ResourceRadar inventory records.

use chrono::{DateTime, Utc};

use super::Amount;
use crate::codec::{Entity, Record, RecordReader, RecordWriter, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub location: String,
    pub quantity: i32,
    pub purchase_price: Amount,
    pub purchase_date: DateTime<Utc>,
    /// `None` when the item has no warranty.
    pub warranty_expires: Option<DateTime<Utc>>,
    /// Free-text maintenance notes, oldest first.
    pub maintenance_history: Vec<String>,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, purchase_date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category: String::new(),
            location: String::new(),
            quantity: 1,
            purchase_price: Amount::ZERO,
            purchase_date,
            warranty_expires: None,
            maintenance_history: Vec::new(),
        }
    }

    pub fn under_warranty(&self, now: DateTime<Utc>) -> bool {
        self.warranty_expires.is_some_and(|end| now <= end)
    }

    pub fn log_maintenance(&mut self, note: impl Into<String>) {
        self.maintenance_history.push(note.into());
    }
}

impl Record for InventoryItem {
    fn encode(&self, w: &mut RecordWriter) -> Result<()> {
        w.write_u64(self.id);
        w.write_str(&self.name)?;
        w.write_str(&self.category)?;
        w.write_str(&self.location)?;
        w.write_i32(self.quantity);
        w.write_i64(self.purchase_price.raw());
        w.write_timestamp(&self.purchase_date);
        w.write_opt_timestamp(self.warranty_expires.as_ref());
        w.write_str_list(&self.maintenance_history)
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            id: r.read_u64()?,
            name: r.read_string()?,
            category: r.read_string()?,
            location: r.read_string()?,
            quantity: r.read_i32()?,
            purchase_price: Amount::from_raw(r.read_i64()?),
            purchase_date: r.read_timestamp()?,
            warranty_expires: r.read_opt_timestamp()?,
            maintenance_history: r.read_str_list()?,
        })
    }
}

impl Entity for InventoryItem {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_from_slice, encode_to_vec};
    use chrono::{Duration, TimeZone};

    #[test]
    fn round_trip_with_history_and_warranty() {
        let bought = Utc.with_ymd_and_hms(2023, 1, 10, 9, 30, 0).unwrap();
        let mut item = InventoryItem::new("Drill", bought);
        item.id = 3;
        item.location = "Garage".into();
        item.quantity = 0;
        item.purchase_price = "89.99".parse().unwrap();
        item.warranty_expires = Some(bought + Duration::days(730));
        item.log_maintenance("new battery");
        item.log_maintenance("");

        let back: InventoryItem = decode_from_slice(&encode_to_vec(&item).unwrap()).unwrap();
        assert_eq!(back, item);
        assert!(back.under_warranty(bought + Duration::days(30)));
        assert!(!back.under_warranty(bought + Duration::days(731)));
    }

    #[test]
    fn missing_warranty_survives_round_trip() {
        let item = InventoryItem::new("Chair", Utc.timestamp_millis_opt(0).unwrap());
        let back: InventoryItem = decode_from_slice(&encode_to_vec(&item).unwrap()).unwrap();
        assert_eq!(back.warranty_expires, None);
        assert!(!back.under_warranty(Utc::now()));
    }
}
