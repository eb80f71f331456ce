use anyhow::{Context, Result};
use sqlx::Executor;

use crate::init::Connection;

/// Compression settings applied to a hypertable once rows age past
/// `compress_after`.
#[derive(Debug, Clone, Copy)]
pub struct Compression {
    pub segment_by: &'static str,
    pub order_by: &'static str,
    pub compress_after: &'static str,
}

/// Time-partitioning settings for a table.
#[derive(Debug, Clone, Copy)]
pub struct Hypertable {
    pub time_column: &'static str,
    pub chunk_interval: &'static str,
    pub compression: Option<Compression>,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub name: &'static str,
    pub columns: &'static str,
}

/// One table of the netpulse schema: its DDL plus the time-series and index
/// metadata that drives the TimescaleDB statements in [`ensure_schema`].
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub ddl: &'static str,
    pub hypertable: Option<Hypertable>,
    pub indexes: &'static [IndexSpec],
}

const CHUNK_2D: &str = "2 days";
const CHUNK_7D: &str = "7 days";
const COMPRESS_AFTER_7D: &str = "7 days";

/// Every table of the schema, reference tables first so foreign keys
/// resolve.
pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "asn",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS asn (
            number      BIGINT PRIMARY KEY,
            name        TEXT    NOT NULL,
            tartiflette BOOLEAN NOT NULL DEFAULT FALSE,
            disco       BOOLEAN NOT NULL DEFAULT FALSE,
            ashash      BOOLEAN NOT NULL DEFAULT FALSE
        );
        "#,
        hypertable: None,
        indexes: &[],
    },
    TableSpec {
        name: "country",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS country (
            code        VARCHAR(4) PRIMARY KEY,
            name        TEXT    NOT NULL,
            tartiflette BOOLEAN NOT NULL DEFAULT FALSE,
            disco       BOOLEAN NOT NULL DEFAULT FALSE
        );
        "#,
        hypertable: None,
        indexes: &[],
    },
    TableSpec {
        name: "atlas_location",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS atlas_location (
            id   BIGSERIAL PRIMARY KEY,
            name TEXT       NOT NULL,
            type VARCHAR(4) NOT NULL,
            af   INTEGER    NOT NULL
        );
        "#,
        hypertable: None,
        indexes: &[IndexSpec {
            name: "atlas_location_af_type_idx",
            columns: "af, type",
        }],
    },
    TableSpec {
        name: "tr_hegemony_identifier",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS tr_hegemony_identifier (
            id   BIGSERIAL PRIMARY KEY,
            name TEXT       NOT NULL,
            type VARCHAR(4) NOT NULL,
            af   INTEGER    NOT NULL
        );
        "#,
        hypertable: None,
        indexes: &[],
    },
    TableSpec {
        name: "hegemony",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS hegemony (
            id        BIGSERIAL,
            timebin   TIMESTAMPTZ      NOT NULL,
            hege      DOUBLE PRECISION NOT NULL DEFAULT 0,
            af        INTEGER          NOT NULL DEFAULT 0,
            asn       BIGINT           NOT NULL,
            originasn BIGINT           NOT NULL,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: Some(Compression {
                segment_by: "af,originasn,asn",
                order_by: "timebin",
                compress_after: COMPRESS_AFTER_7D,
            }),
        }),
        indexes: &[
            IndexSpec {
                name: "hegemony_asn_timebin_idx",
                columns: "asn, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_originasn_timebin_idx",
                columns: "originasn, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_asn_originasn_timebin_idx",
                columns: "asn, originasn, timebin DESC",
            },
        ],
    },
    TableSpec {
        name: "hegemony_cone",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS hegemony_cone (
            id       BIGSERIAL,
            timebin  TIMESTAMPTZ NOT NULL,
            conesize INTEGER     NOT NULL DEFAULT 0,
            af       INTEGER     NOT NULL DEFAULT 0,
            asn      BIGINT      NOT NULL REFERENCES asn(number) ON DELETE CASCADE,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: Some(Compression {
                segment_by: "asn,af",
                order_by: "timebin",
                compress_after: COMPRESS_AFTER_7D,
            }),
        }),
        indexes: &[
            IndexSpec {
                name: "hegemony_cone_asn_timebin_idx",
                columns: "asn, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_cone_asn_idx",
                columns: "asn",
            },
        ],
    },
    TableSpec {
        name: "hegemony_alarms",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS hegemony_alarms (
            id        BIGSERIAL,
            timebin   TIMESTAMPTZ      NOT NULL,
            deviation DOUBLE PRECISION NOT NULL DEFAULT 0,
            af        INTEGER          NOT NULL,
            asn       BIGINT           NOT NULL,
            originasn BIGINT           NOT NULL,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[
            IndexSpec {
                name: "hegemony_alarms_asn_timebin_idx",
                columns: "asn, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_alarms_originasn_timebin_idx",
                columns: "originasn, timebin DESC",
            },
        ],
    },
    TableSpec {
        name: "hegemony_country",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS hegemony_country (
            id           BIGSERIAL,
            timebin      TIMESTAMPTZ      NOT NULL,
            hege         DOUBLE PRECISION NOT NULL DEFAULT 0,
            af           INTEGER          NOT NULL DEFAULT 0,
            weight       DOUBLE PRECISION NOT NULL DEFAULT 0,
            weightscheme VARCHAR(16)      NOT NULL DEFAULT 'None',
            transitonly  BOOLEAN          NOT NULL DEFAULT FALSE,
            asn          BIGINT           NOT NULL REFERENCES asn(number) ON DELETE CASCADE,
            country      VARCHAR(4)       NOT NULL REFERENCES country(code) ON DELETE CASCADE,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[
            IndexSpec {
                name: "hegemony_country_asn_timebin_idx",
                columns: "asn, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_country_country_timebin_idx",
                columns: "country, timebin DESC",
            },
        ],
    },
    TableSpec {
        name: "hegemony_prefix",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS hegemony_prefix (
            id                      BIGSERIAL,
            timebin                 TIMESTAMPTZ      NOT NULL,
            prefix                  VARCHAR(64)      NOT NULL,
            hege                    DOUBLE PRECISION NOT NULL DEFAULT 0,
            af                      INTEGER          NOT NULL DEFAULT 0,
            visibility              DOUBLE PRECISION NOT NULL DEFAULT 0,
            rpki_status             VARCHAR(32)      NOT NULL,
            irr_status              VARCHAR(32)      NOT NULL,
            delegated_prefix_status VARCHAR(32)      NOT NULL,
            delegated_asn_status    VARCHAR(32)      NOT NULL,
            descr                   VARCHAR(64)      NOT NULL,
            moas                    BOOLEAN          NOT NULL DEFAULT FALSE,
            asn                     BIGINT           NOT NULL,
            originasn               BIGINT           NOT NULL,
            country                 VARCHAR(4)       NOT NULL,
            PRIMARY KEY (timebin, id)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[
            IndexSpec {
                name: "hegemony_prefix_prefix_timebin_idx",
                columns: "prefix, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_prefix_asn_timebin_idx",
                columns: "asn, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_prefix_originasn_timebin_idx",
                columns: "originasn, timebin DESC",
            },
            IndexSpec {
                name: "hegemony_prefix_country_timebin_idx",
                columns: "country, timebin DESC",
            },
        ],
    },
    TableSpec {
        name: "tr_hegemony",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS tr_hegemony (
            id            BIGSERIAL,
            timebin       TIMESTAMPTZ      NOT NULL,
            hege          DOUBLE PRECISION NOT NULL DEFAULT 0,
            af            INTEGER          NOT NULL DEFAULT 0,
            nbsamples     INTEGER          NOT NULL DEFAULT 0,
            dependency_id BIGINT           NOT NULL REFERENCES tr_hegemony_identifier(id) ON DELETE CASCADE,
            origin_id     BIGINT           NOT NULL REFERENCES tr_hegemony_identifier(id) ON DELETE CASCADE,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[
            IndexSpec {
                name: "tr_hegemony_dependency_timebin_idx",
                columns: "dependency_id, timebin DESC",
            },
            IndexSpec {
                name: "tr_hegemony_origin_timebin_idx",
                columns: "origin_id, timebin DESC",
            },
        ],
    },
    TableSpec {
        name: "delay",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS delay (
            id        BIGSERIAL,
            timebin   TIMESTAMPTZ      NOT NULL,
            magnitude DOUBLE PRECISION NOT NULL DEFAULT 0,
            asn       BIGINT           NOT NULL,
            PRIMARY KEY (timebin, id)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[IndexSpec {
            name: "delay_asn_timebin_idx",
            columns: "asn, timebin DESC",
        }],
    },
    TableSpec {
        name: "forwarding",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS forwarding (
            id        BIGSERIAL,
            timebin   TIMESTAMPTZ      NOT NULL,
            magnitude DOUBLE PRECISION NOT NULL DEFAULT 0,
            asn       BIGINT           NOT NULL REFERENCES asn(number) ON DELETE CASCADE,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[IndexSpec {
            name: "forwarding_asn_timebin_idx",
            columns: "asn, timebin DESC",
        }],
    },
    TableSpec {
        name: "delay_alarms",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS delay_alarms (
            id          BIGSERIAL,
            timebin     TIMESTAMPTZ      NOT NULL,
            ip          VARCHAR(64)      NOT NULL,
            link        VARCHAR(128)     NOT NULL,
            medianrtt   DOUBLE PRECISION NOT NULL DEFAULT 0,
            diffmedian  DOUBLE PRECISION NOT NULL DEFAULT 0,
            deviation   DOUBLE PRECISION NOT NULL DEFAULT 0,
            nbprobes    INTEGER          NOT NULL DEFAULT 0,
            msm_prb_ids JSONB,
            asn         BIGINT           NOT NULL REFERENCES asn(number) ON DELETE CASCADE,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[IndexSpec {
            name: "delay_alarms_asn_timebin_idx",
            columns: "asn, timebin DESC",
        }],
    },
    TableSpec {
        name: "forwarding_alarms",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS forwarding_alarms (
            id             BIGSERIAL,
            timebin        TIMESTAMPTZ      NOT NULL,
            ip             VARCHAR(64)      NOT NULL,
            correlation    DOUBLE PRECISION NOT NULL DEFAULT 0,
            responsibility DOUBLE PRECISION NOT NULL DEFAULT 0,
            pktdiff        DOUBLE PRECISION NOT NULL DEFAULT 0,
            previoushop    VARCHAR(64)      NOT NULL,
            msm_prb_ids    JSONB,
            asn            BIGINT           NOT NULL,
            PRIMARY KEY (timebin, id)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[IndexSpec {
            name: "forwarding_alarms_asn_timebin_idx",
            columns: "asn, timebin DESC",
        }],
    },
    TableSpec {
        name: "atlas_delay",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS atlas_delay (
            id            BIGSERIAL,
            timebin       TIMESTAMPTZ      NOT NULL,
            median        DOUBLE PRECISION NOT NULL DEFAULT 0,
            nbtracks      INTEGER          NOT NULL DEFAULT 0,
            nbprobes      INTEGER          NOT NULL DEFAULT 0,
            entropy       DOUBLE PRECISION NOT NULL DEFAULT 0,
            hop           INTEGER          NOT NULL DEFAULT 0,
            nbrealrtts    INTEGER          NOT NULL DEFAULT 0,
            startpoint_id BIGINT           NOT NULL REFERENCES atlas_location(id) ON DELETE CASCADE,
            endpoint_id   BIGINT           NOT NULL REFERENCES atlas_location(id) ON DELETE CASCADE,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: Some(Compression {
                segment_by: "startpoint_id,endpoint_id",
                order_by: "timebin",
                compress_after: COMPRESS_AFTER_7D,
            }),
        }),
        indexes: &[
            IndexSpec {
                name: "atlas_delay_endpoint_timebin_idx",
                columns: "endpoint_id, timebin DESC",
            },
            IndexSpec {
                name: "atlas_delay_startpoint_endpoint_timebin_idx",
                columns: "startpoint_id, endpoint_id, timebin DESC",
            },
            IndexSpec {
                name: "atlas_delay_startpoint_timebin_idx",
                columns: "startpoint_id, timebin DESC",
            },
        ],
    },
    TableSpec {
        name: "atlas_delay_alarms",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS atlas_delay_alarms (
            id            BIGSERIAL,
            timebin       TIMESTAMPTZ      NOT NULL,
            deviation     DOUBLE PRECISION NOT NULL DEFAULT 0,
            startpoint_id BIGINT           NOT NULL REFERENCES atlas_location(id) ON DELETE CASCADE,
            endpoint_id   BIGINT           NOT NULL REFERENCES atlas_location(id) ON DELETE CASCADE,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_2D,
            compression: None,
        }),
        indexes: &[
            IndexSpec {
                name: "atlas_delay_alarms_startpoint_timebin_idx",
                columns: "startpoint_id, timebin DESC",
            },
            IndexSpec {
                name: "atlas_delay_alarms_endpoint_timebin_idx",
                columns: "endpoint_id, timebin DESC",
            },
        ],
    },
    TableSpec {
        name: "disco_events",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS disco_events (
            id            BIGSERIAL PRIMARY KEY,
            mongoid       VARCHAR(24)      NOT NULL DEFAULT '000000000000000000000000',
            streamtype    VARCHAR(10)      NOT NULL,
            streamname    VARCHAR(128)     NOT NULL,
            starttime     TIMESTAMPTZ      NOT NULL,
            endtime       TIMESTAMPTZ      NOT NULL,
            avglevel      DOUBLE PRECISION NOT NULL DEFAULT 0,
            nbdiscoprobes INTEGER          NOT NULL DEFAULT 0,
            totalprobes   INTEGER          NOT NULL DEFAULT 0,
            ongoing       BOOLEAN          NOT NULL DEFAULT FALSE
        );
        "#,
        hypertable: None,
        indexes: &[IndexSpec {
            name: "disco_events_stream_idx",
            columns: "streamtype, streamname, starttime, endtime",
        }],
    },
    TableSpec {
        name: "disco_probes",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS disco_probes (
            id        BIGSERIAL PRIMARY KEY,
            probe_id  INTEGER          NOT NULL,
            starttime TIMESTAMPTZ      NOT NULL,
            endtime   TIMESTAMPTZ      NOT NULL,
            level     DOUBLE PRECISION NOT NULL DEFAULT 0,
            ipv4      VARCHAR(64)      NOT NULL DEFAULT 'None',
            prefixv4  VARCHAR(70)      NOT NULL DEFAULT 'None',
            lat       DOUBLE PRECISION NOT NULL DEFAULT 0,
            lon       DOUBLE PRECISION NOT NULL DEFAULT 0,
            event_id  BIGINT           NOT NULL REFERENCES disco_events(id) ON DELETE CASCADE
        );
        "#,
        hypertable: None,
        indexes: &[IndexSpec {
            name: "disco_probes_event_idx",
            columns: "event_id",
        }],
    },
    TableSpec {
        name: "metis_atlas_deployment",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS metis_atlas_deployment (
            id        BIGSERIAL,
            timebin   TIMESTAMPTZ      NOT NULL,
            metric    VARCHAR(16)      NOT NULL,
            rank      INTEGER          NOT NULL,
            af        INTEGER          NOT NULL,
            mean      DOUBLE PRECISION NOT NULL DEFAULT 0,
            nbsamples INTEGER          NOT NULL DEFAULT 0,
            asn       BIGINT           NOT NULL,
            PRIMARY KEY (timebin, id)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_7D,
            compression: None,
        }),
        indexes: &[IndexSpec {
            name: "metis_atlas_deployment_metric_rank_timebin_idx",
            columns: "metric, rank, timebin",
        }],
    },
    TableSpec {
        name: "metis_atlas_selection",
        ddl: r#"
        CREATE TABLE IF NOT EXISTS metis_atlas_selection (
            id      BIGSERIAL,
            timebin TIMESTAMPTZ      NOT NULL,
            metric  VARCHAR(16)      NOT NULL,
            rank    INTEGER          NOT NULL,
            af      INTEGER          NOT NULL,
            mean    DOUBLE PRECISION NOT NULL DEFAULT 0,
            asn     BIGINT           NOT NULL,
            PRIMARY KEY (id, timebin)
        );
        "#,
        hypertable: Some(Hypertable {
            time_column: "timebin",
            chunk_interval: CHUNK_7D,
            compression: None,
        }),
        indexes: &[IndexSpec {
            name: "metis_atlas_selection_metric_rank_timebin_idx",
            columns: "metric, rank, timebin",
        }],
    },
];

fn hypertable_statements(table: &TableSpec, h: &Hypertable) -> Vec<String> {
    let mut stmts = vec![format!(
        "SELECT create_hypertable('{}', '{}', chunk_time_interval => INTERVAL '{}', \
         if_not_exists => TRUE, migrate_data => TRUE);",
        table.name, h.time_column, h.chunk_interval
    )];
    if let Some(c) = &h.compression {
        stmts.push(format!(
            "ALTER TABLE {} SET (timescaledb.compress, timescaledb.compress_segmentby = '{}', \
             timescaledb.compress_orderby = '{}');",
            table.name, c.segment_by, c.order_by
        ));
        stmts.push(format!(
            "SELECT add_compression_policy('{}', INTERVAL '{}', if_not_exists => TRUE);",
            table.name, c.compress_after
        ));
    }
    stmts
}

fn index_statement(table: &TableSpec, idx: &IndexSpec) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
        idx.name, table.name, idx.columns
    )
}

/// True when `NP_PLAIN_TABLES=1`: skip the TimescaleDB statements so the
/// schema can be created on stock Postgres (test databases).
fn plain_tables() -> bool {
    std::env::var("NP_PLAIN_TABLES").map(|v| v == "1").unwrap_or(false)
}

/// Ensure every table, hypertable conversion, compression policy, and
/// secondary index exists. Every statement is idempotent; re-running after a
/// partial failure completes the remainder.
pub async fn ensure_schema(pool: &Connection) -> Result<()> {
    let plain = plain_tables();
    for table in TABLES {
        pool.execute(table.ddl)
            .await
            .with_context(|| format!("creating table {}", table.name))?;

        if let Some(h) = &table.hypertable {
            if plain {
                tracing::debug!(table = table.name, "NP_PLAIN_TABLES set, skipping hypertable setup");
            } else {
                for stmt in hypertable_statements(table, h) {
                    pool.execute(stmt.as_str())
                        .await
                        .with_context(|| format!("time-series setup for {}", table.name))?;
                }
            }
        }

        for idx in table.indexes {
            pool.execute(index_statement(table, idx).as_str())
                .await
                .with_context(|| format!("creating index {}", idx.name))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> &'static TableSpec {
        TABLES.iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<&str> = TABLES.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TABLES.len());
    }

    #[test]
    fn hypertables_partition_on_timebin() {
        for table in TABLES.iter().filter(|t| t.hypertable.is_some()) {
            let h = table.hypertable.as_ref().unwrap();
            assert_eq!(h.time_column, "timebin", "{}", table.name);
            assert!(
                table.ddl.contains("timebin"),
                "{} DDL must declare the partition column",
                table.name
            );
        }
    }

    #[test]
    fn compressed_tables_emit_policy_statements() {
        let table = spec("hegemony");
        let stmts = hypertable_statements(table, table.hypertable.as_ref().unwrap());
        assert_eq!(stmts.len(), 3);
        assert!(stmts[0].contains("create_hypertable('hegemony', 'timebin'"));
        assert!(stmts[0].contains("if_not_exists => TRUE"));
        assert!(stmts[1].contains("timescaledb.compress_segmentby = 'af,originasn,asn'"));
        assert!(stmts[2].contains("add_compression_policy('hegemony', INTERVAL '7 days'"));
    }

    #[test]
    fn uncompressed_hypertable_emits_single_statement() {
        let table = spec("delay");
        let stmts = hypertable_statements(table, table.hypertable.as_ref().unwrap());
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn index_statement_is_idempotent() {
        let table = spec("disco_probes");
        let sql = index_statement(table, &table.indexes[0]);
        assert_eq!(
            sql,
            "CREATE INDEX IF NOT EXISTS disco_probes_event_idx ON disco_probes (event_id);"
        );
    }
}
