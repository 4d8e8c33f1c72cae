use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DonationType {
    Food,
    Money,
    Clothes,
    Furniture,
}

impl DonationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationType::Food => "food",
            DonationType::Money => "money",
            DonationType::Clothes => "clothes",
            DonationType::Furniture => "furniture",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    #[serde(rename = "self")]
    SelfDelivery,
    Pickup,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Approved,
    Rejected,
    InTransit,
    Delivered,
}

impl DonationStatus {
    /// The lifecycle graph. `Rejected` and `Delivered` are terminal; nothing
    /// skips a state or moves backward.
    pub fn can_transition_to(self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Pending, DonationStatus::Approved)
                | (DonationStatus::Pending, DonationStatus::Rejected)
                | (DonationStatus::Approved, DonationStatus::InTransit)
                | (DonationStatus::InTransit, DonationStatus::Delivered)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Approved => "approved",
            DonationStatus::Rejected => "rejected",
            DonationStatus::InTransit => "in_transit",
            DonationStatus::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FoodDetails {
    pub meals_count: Option<u32>,
    pub food_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MoneyDetails {
    pub amount: Option<f64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClothesDetails {
    pub quantity: Option<u32>,
    pub clothing_type: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FurnitureDetails {
    pub item_description: Option<String>,
    pub quantity: Option<u32>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

/// Tagged union over the per-type detail payloads. On the wire this keeps the
/// `donation_type` / `details` sibling fields the clients already send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "donation_type", content = "details", rename_all = "snake_case")]
pub enum DonationDetails {
    Food(FoodDetails),
    Money(MoneyDetails),
    Clothes(ClothesDetails),
    Furniture(FurnitureDetails),
}

impl DonationDetails {
    /// Validates a raw `details` payload against the declared donation type.
    /// A missing payload is an empty detail record, not an error.
    pub fn parse(donation_type: DonationType, raw: Option<Value>) -> Result<Self, AppError> {
        let raw = match raw {
            Some(Value::Null) | None => {
                return Ok(match donation_type {
                    DonationType::Food => DonationDetails::Food(FoodDetails::default()),
                    DonationType::Money => DonationDetails::Money(MoneyDetails::default()),
                    DonationType::Clothes => DonationDetails::Clothes(ClothesDetails::default()),
                    DonationType::Furniture => {
                        DonationDetails::Furniture(FurnitureDetails::default())
                    }
                });
            }
            Some(value) => value,
        };

        let parsed = match donation_type {
            DonationType::Food => serde_json::from_value(raw).map(DonationDetails::Food),
            DonationType::Money => serde_json::from_value(raw).map(DonationDetails::Money),
            DonationType::Clothes => serde_json::from_value(raw).map(DonationDetails::Clothes),
            DonationType::Furniture => serde_json::from_value(raw).map(DonationDetails::Furniture),
        };

        let details =
            parsed.map_err(|err| AppError::Validation(format!("details: {err}")))?;

        if let DonationDetails::Money(money) = &details {
            if let Some(amount) = money.amount {
                if amount <= 0.0 {
                    return Err(AppError::Validation("details.amount: must be > 0".to_string()));
                }
            }
        }

        Ok(details)
    }

    pub fn donation_type(&self) -> DonationType {
        match self {
            DonationDetails::Food(_) => DonationType::Food,
            DonationDetails::Money(_) => DonationType::Money,
            DonationDetails::Clothes(_) => DonationType::Clothes,
            DonationDetails::Furniture(_) => DonationType::Furniture,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub orphanage_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: DonationDetails,
    pub delivery_method: DeliveryMethod,
    pub pickup_address: Option<String>,
    pub pickup_date: Option<String>,
    pub assigned_volunteer_id: Option<Uuid>,
    pub status: DonationStatus,
    pub decision_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lifecycle_graph_allows_only_forward_edges() {
        use DonationStatus::*;

        let all = [Pending, Approved, Rejected, InTransit, Delivered];
        let allowed = [
            (Pending, Approved),
            (Pending, Rejected),
            (Approved, InTransit),
            (InTransit, Delivered),
        ];

        for from in all {
            for to in all {
                let expected = allowed.contains(&(from, to));
                assert_eq!(from.can_transition_to(to), expected, "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        use DonationStatus::*;

        for next in [Pending, Approved, Rejected, InTransit, Delivered] {
            assert!(!Rejected.can_transition_to(next));
            assert!(!Delivered.can_transition_to(next));
        }
    }

    #[test]
    fn parse_food_details() {
        let details = DonationDetails::parse(
            DonationType::Food,
            Some(json!({ "meals_count": 50, "food_type": "cooked" })),
        )
        .unwrap();

        assert_eq!(
            details,
            DonationDetails::Food(FoodDetails {
                meals_count: Some(50),
                food_type: Some("cooked".to_string()),
                notes: None,
            })
        );
    }

    #[test]
    fn parse_missing_details_yields_empty_record() {
        let details = DonationDetails::parse(DonationType::Clothes, None).unwrap();
        assert_eq!(details.donation_type(), DonationType::Clothes);
    }

    #[test]
    fn parse_rejects_fields_from_another_type() {
        let err = DonationDetails::parse(
            DonationType::Money,
            Some(json!({ "meals_count": 10 })),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn parse_rejects_non_positive_amount() {
        let err = DonationDetails::parse(
            DonationType::Money,
            Some(json!({ "amount": 0.0 })),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn donation_wire_shape_keeps_sibling_fields() {
        let details = DonationDetails::Food(FoodDetails {
            meals_count: Some(5),
            food_type: None,
            notes: None,
        });

        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["donation_type"], "food");
        assert_eq!(value["details"]["meals_count"], 5);
    }
}
