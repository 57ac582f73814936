//! Carrier directory seeding.
//!
//! One-time upsert of the known carriers. The upstream credential is an
//! explicit input (injected from configuration at daemon boot), never a
//! compiled-in literal, and must not be logged here or anywhere else.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub const ENV_CARRIER_API_KEY: &str = "TRK_CARRIER_API_KEY";

/// Stand-in upstream tracking API. No real carrier protocol is implemented
/// behind these URLs.
const UPSTREAM_API_BASE: &str = "https://api.tracking.example.com";

struct SeedCarrier {
    name: &'static str,
    code: &'static str,
    /// Path segment on the upstream API; empty for the unified service.
    api_path: &'static str,
    tracking_url: &'static str,
}

const SEED_CARRIERS: &[SeedCarrier] = &[
    SeedCarrier {
        name: "CJ대한통운",
        code: "cjlogistics",
        api_path: "cj",
        tracking_url: "https://www.cjlogistics.com/ko/tool/parcel/tracking?gnbInvcNo=",
    },
    SeedCarrier {
        name: "우체국택배",
        code: "koreapost",
        api_path: "koreapost",
        tracking_url: "https://service.epost.go.kr/trace.RetrieveRegiPrclDeliv.postal?sid1=",
    },
    SeedCarrier {
        name: "롯데택배",
        code: "lotte",
        api_path: "lotte",
        tracking_url: "https://www.lotteglogis.com/mobile/reservation/tracking/linkView?InvNo=",
    },
    SeedCarrier {
        name: "한진택배",
        code: "hanjin",
        api_path: "hanjin",
        tracking_url:
            "https://www.hanjin.com/kor/CMS/DeliveryMgr/WaybillResult.do?mCode=MN038&schLang=KR&wblnumText2=",
    },
    SeedCarrier {
        name: "CU 편의점택배",
        code: "cupost",
        api_path: "cupost",
        tracking_url: "https://www.cupost.co.kr/postbox/delivery/tracking.cupost?invoice_no=",
    },
    SeedCarrier {
        name: "통합배송추적API",
        code: "userapi",
        api_path: "",
        tracking_url: "https://tracking.example.com/?t_invoice=",
    },
];

fn endpoint(api_path: &str, capability: &str, api_key: &str) -> String {
    if api_path.is_empty() {
        format!("{UPSTREAM_API_BASE}/{capability}?key={api_key}")
    } else {
        format!("{UPSTREAM_API_BASE}/{api_path}/{capability}?key={api_key}")
    }
}

/// Upsert the seed carriers, refreshing endpoint URLs and the credential for
/// codes that already exist (name and deep link keep their stored values).
/// Also removes the retired `smartdelivery` entry. Safe to run on every boot.
pub async fn seed_carriers(pool: &PgPool, api_key: &str) -> Result<()> {
    for carrier in SEED_CARRIERS {
        sqlx::query(
            r#"
            insert into carriers (
              id, name, code, tracking_url, tracking_info_url, delivery_time_url,
              location_url, status_url, api_key, api_key_url
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            )
            on conflict (code) do update set
              tracking_info_url = excluded.tracking_info_url,
              delivery_time_url = excluded.delivery_time_url,
              location_url = excluded.location_url,
              status_url = excluded.status_url,
              api_key = excluded.api_key,
              api_key_url = excluded.api_key_url
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(carrier.name)
        .bind(carrier.code)
        .bind(carrier.tracking_url)
        .bind(endpoint(carrier.api_path, "tracking", api_key))
        .bind(endpoint(carrier.api_path, "delivery-time", api_key))
        .bind(endpoint(carrier.api_path, "location", api_key))
        .bind(endpoint(carrier.api_path, "status", api_key))
        .bind(api_key)
        .bind(format!("{UPSTREAM_API_BASE}/auth?key={api_key}"))
        .execute(pool)
        .await
        .with_context(|| format!("seed upsert failed for carrier {}", carrier.code))?;
    }

    // Legacy entry retired; this is the only carrier deletion anywhere.
    sqlx::query("delete from carriers where code = 'smartdelivery'")
        .execute(pool)
        .await
        .context("legacy carrier cleanup failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_key_as_query_parameter() {
        assert_eq!(
            endpoint("cj", "status", "k-123"),
            "https://api.tracking.example.com/cj/status?key=k-123"
        );
        assert_eq!(
            endpoint("", "tracking", "k-123"),
            "https://api.tracking.example.com/tracking?key=k-123"
        );
    }

    #[test]
    fn seed_set_has_unique_codes() {
        let mut codes: Vec<&str> = SEED_CARRIERS.iter().map(|c| c.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), SEED_CARRIERS.len());
    }
}
