use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub otp_requests_total: IntCounterVec,
    pub donations_created_total: IntCounterVec,
    pub donation_transitions_total: IntCounterVec,
    pub orphanages_awaiting_approval: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let otp_requests_total = IntCounterVec::new(
            Opts::new("otp_requests_total", "OTP requests by flow"),
            &["flow"],
        )
        .expect("valid otp_requests_total metric");

        let donations_created_total = IntCounterVec::new(
            Opts::new("donations_created_total", "Donations created by type"),
            &["donation_type"],
        )
        .expect("valid donations_created_total metric");

        let donation_transitions_total = IntCounterVec::new(
            Opts::new(
                "donation_transitions_total",
                "Donation status transitions by target status",
            ),
            &["to"],
        )
        .expect("valid donation_transitions_total metric");

        let orphanages_awaiting_approval = IntGauge::new(
            "orphanages_awaiting_approval",
            "Current number of orphanages awaiting admin approval",
        )
        .expect("valid orphanages_awaiting_approval metric");

        registry
            .register(Box::new(otp_requests_total.clone()))
            .expect("register otp_requests_total");
        registry
            .register(Box::new(donations_created_total.clone()))
            .expect("register donations_created_total");
        registry
            .register(Box::new(donation_transitions_total.clone()))
            .expect("register donation_transitions_total");
        registry
            .register(Box::new(orphanages_awaiting_approval.clone()))
            .expect("register orphanages_awaiting_approval");

        Self {
            registry,
            otp_requests_total,
            donations_created_total,
            donation_transitions_total,
            orphanages_awaiting_approval,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
