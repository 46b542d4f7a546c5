use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Timeseries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Timeseries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Timeseries::Name)
                            .string_len(80)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Timeseries::Description).string())
                    .col(ColumnDef::new(Timeseries::Unit).string())
                    .col(ColumnDef::new(Timeseries::MinValue).double())
                    .col(ColumnDef::new(Timeseries::MaxValue).double())
                    .to_owned(),
            )
            .await?;

        // Time-partitioned fact table. No secondary indexes beyond the
        // composite primary key: the (timeseries_id, timestamp) PK doubles
        // as the partitioning index (`spec.md` §4.1 `setup`).
        manager
            .create_table(
                Table::create()
                    .table(TimeseriesData::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TimeseriesData::TimeseriesId).big_integer().not_null())
                    .col(
                        ColumnDef::new(TimeseriesData::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TimeseriesData::Value).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(TimeseriesData::TimeseriesId)
                            .col(TimeseriesData::Timestamp),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timeseries_data_timeseries")
                            .from(TimeseriesData::Table, TimeseriesData::TimeseriesId)
                            .to(Timeseries::Table, Timeseries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttBroker::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MqttBroker::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MqttBroker::Host).string().not_null())
                    .col(ColumnDef::new(MqttBroker::Port).integer().not_null())
                    .col(ColumnDef::new(MqttBroker::ProtocolVersion).string().not_null())
                    .col(ColumnDef::new(MqttBroker::Transport).string().not_null())
                    .col(ColumnDef::new(MqttBroker::IsAuthRequired).boolean().not_null().default(false))
                    .col(ColumnDef::new(MqttBroker::UseTls).boolean().not_null().default(false))
                    .col(ColumnDef::new(MqttBroker::TlsVersion).string())
                    .col(ColumnDef::new(MqttBroker::TlsVerifymode).string())
                    .col(ColumnDef::new(MqttBroker::TlsCertificate).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttSubscriber::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MqttSubscriber::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MqttSubscriber::BrokerId).big_integer().not_null())
                    .col(ColumnDef::new(MqttSubscriber::IsEnabled).boolean().not_null().default(true))
                    .col(ColumnDef::new(MqttSubscriber::KeepAlive).integer().not_null().default(60))
                    .col(ColumnDef::new(MqttSubscriber::UsePersistentSession).boolean().not_null().default(false))
                    .col(ColumnDef::new(MqttSubscriber::SessionExpiry).integer().not_null().default(0))
                    .col(ColumnDef::new(MqttSubscriber::Username).string())
                    .col(ColumnDef::new(MqttSubscriber::Password).string())
                    .col(ColumnDef::new(MqttSubscriber::IsConnected).boolean().not_null().default(false))
                    .col(ColumnDef::new(MqttSubscriber::TimestampLastConnection).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriber_broker")
                            .from(MqttSubscriber::Table, MqttSubscriber::BrokerId)
                            .to(MqttBroker::Table, MqttBroker::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttPayloadDecoder::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MqttPayloadDecoder::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MqttPayloadDecoder::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(MqttPayloadDecoder::Description).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttPayloadField::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MqttPayloadField::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MqttPayloadField::PayloadDecoderId).big_integer().not_null())
                    .col(ColumnDef::new(MqttPayloadField::Name).string().not_null())
                    .index(
                        Index::create()
                            .name("uq_payload_field_decoder_name")
                            .col(MqttPayloadField::PayloadDecoderId)
                            .col(MqttPayloadField::Name)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payload_field_decoder")
                            .from(MqttPayloadField::Table, MqttPayloadField::PayloadDecoderId)
                            .to(MqttPayloadDecoder::Table, MqttPayloadDecoder::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttTopic::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MqttTopic::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MqttTopic::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(MqttTopic::Qos).integer().not_null().default(1))
                    .col(ColumnDef::new(MqttTopic::Description).string())
                    .col(ColumnDef::new(MqttTopic::PayloadDecoderId).big_integer().not_null())
                    .col(ColumnDef::new(MqttTopic::IsEnabled).boolean().not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_decoder")
                            .from(MqttTopic::Table, MqttTopic::PayloadDecoderId)
                            .to(MqttPayloadDecoder::Table, MqttPayloadDecoder::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttTopicByBroker::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MqttTopicByBroker::TopicId).big_integer().not_null())
                    .col(ColumnDef::new(MqttTopicByBroker::BrokerId).big_integer().not_null())
                    .col(ColumnDef::new(MqttTopicByBroker::IsEnabled).boolean().not_null().default(true))
                    .primary_key(
                        Index::create()
                            .col(MqttTopicByBroker::TopicId)
                            .col(MqttTopicByBroker::BrokerId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_by_broker_topic")
                            .from(MqttTopicByBroker::Table, MqttTopicByBroker::TopicId)
                            .to(MqttTopic::Table, MqttTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_by_broker_broker")
                            .from(MqttTopicByBroker::Table, MqttTopicByBroker::BrokerId)
                            .to(MqttBroker::Table, MqttBroker::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttTopicBySubscriber::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MqttTopicBySubscriber::TopicId).big_integer().not_null())
                    .col(ColumnDef::new(MqttTopicBySubscriber::SubscriberId).big_integer().not_null())
                    .col(ColumnDef::new(MqttTopicBySubscriber::IsSubscribed).boolean().not_null().default(false))
                    .col(ColumnDef::new(MqttTopicBySubscriber::TimestampLastSubscription).timestamp_with_time_zone())
                    .col(ColumnDef::new(MqttTopicBySubscriber::IsEnabled).boolean().not_null().default(true))
                    .primary_key(
                        Index::create()
                            .col(MqttTopicBySubscriber::TopicId)
                            .col(MqttTopicBySubscriber::SubscriberId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_by_subscriber_topic")
                            .from(MqttTopicBySubscriber::Table, MqttTopicBySubscriber::TopicId)
                            .to(MqttTopic::Table, MqttTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_by_subscriber_subscriber")
                            .from(MqttTopicBySubscriber::Table, MqttTopicBySubscriber::SubscriberId)
                            .to(MqttSubscriber::Table, MqttSubscriber::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MqttTopicLink::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MqttTopicLink::TopicId).big_integer().not_null())
                    .col(ColumnDef::new(MqttTopicLink::PayloadFieldId).big_integer().not_null())
                    .col(ColumnDef::new(MqttTopicLink::TimeseriesId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(MqttTopicLink::TopicId)
                            .col(MqttTopicLink::PayloadFieldId)
                            .col(MqttTopicLink::TimeseriesId),
                    )
                    .index(
                        Index::create()
                            .name("uq_topic_link_field")
                            .col(MqttTopicLink::TopicId)
                            .col(MqttTopicLink::PayloadFieldId)
                            .unique(),
                    )
                    .index(
                        Index::create()
                            .name("uq_topic_link_timeseries")
                            .col(MqttTopicLink::TopicId)
                            .col(MqttTopicLink::TimeseriesId)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_link_topic")
                            .from(MqttTopicLink::Table, MqttTopicLink::TopicId)
                            .to(MqttTopic::Table, MqttTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_link_field")
                            .from(MqttTopicLink::Table, MqttTopicLink::PayloadFieldId)
                            .to(MqttPayloadField::Table, MqttPayloadField::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_link_timeseries")
                            .from(MqttTopicLink::Table, MqttTopicLink::TimeseriesId)
                            .to(Timeseries::Table, Timeseries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Event lookup tables, seeded immediately after creation
        // (`spec.md` §4.4 "Seed data installed on first schema creation",
        // grounded on `original_source/bemserver/core/model/event.py`'s
        // `after_create` listeners).
        manager
            .create_table(
                Table::create()
                    .table(EventCategory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventCategory::Id).string_len(80).not_null().primary_key())
                    .col(ColumnDef::new(EventCategory::Description).string())
                    .col(ColumnDef::new(EventCategory::Parent).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_category_parent")
                            .from(EventCategory::Table, EventCategory::Parent)
                            .to(EventCategory::Table, EventCategory::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventState::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventState::Id).string_len(80).not_null().primary_key())
                    .col(ColumnDef::new(EventState::Description).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventLevel::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventLevel::Id).string_len(80).not_null().primary_key())
                    .col(ColumnDef::new(EventLevel::Description).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventTarget::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventTarget::Id).string_len(80).not_null().primary_key())
                    .col(ColumnDef::new(EventTarget::Description).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Event::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Event::Category).string_len(80).not_null())
                    .col(ColumnDef::new(Event::Level).string_len(80).not_null())
                    .col(ColumnDef::new(Event::State).string_len(80).not_null())
                    .col(ColumnDef::new(Event::Source).string().not_null())
                    .col(ColumnDef::new(Event::TargetType).string_len(80).not_null())
                    .col(ColumnDef::new(Event::TargetId).big_integer().not_null())
                    .col(ColumnDef::new(Event::TimestampStart).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Event::TimestampEnd).timestamp_with_time_zone())
                    .col(ColumnDef::new(Event::TimestampLastUpdate).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Event::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_category")
                            .from(Event::Table, Event::Category)
                            .to(EventCategory::Table, EventCategory::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_level")
                            .from(Event::Table, Event::Level)
                            .to(EventLevel::Table, EventLevel::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_state")
                            .from(Event::Table, Event::State)
                            .to(EventState::Table, EventState::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_target")
                            .from(Event::Table, Event::TargetType)
                            .to(EventTarget::Table, EventTarget::Id),
                    )
                    .to_owned(),
            )
            .await?;

        seed_event_lookups(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Event::Table.into_iden(),
            EventTarget::Table.into_iden(),
            EventLevel::Table.into_iden(),
            EventState::Table.into_iden(),
            EventCategory::Table.into_iden(),
            MqttTopicLink::Table.into_iden(),
            MqttTopicBySubscriber::Table.into_iden(),
            MqttTopicByBroker::Table.into_iden(),
            MqttTopic::Table.into_iden(),
            MqttPayloadField::Table.into_iden(),
            MqttPayloadDecoder::Table.into_iden(),
            MqttSubscriber::Table.into_iden(),
            MqttBroker::Table.into_iden(),
            TimeseriesData::Table.into_iden(),
            Timeseries::Table.into_iden(),
        ] {
            manager.drop_table(Table::drop().table(table).to_owned()).await?;
        }
        Ok(())
    }
}

async fn seed_event_lookups(manager: &SchemaManager) -> Result<(), DbErr> {
    let db = manager.get_connection();

    for (id, description) in [
        ("INFO", "Information"),
        ("WARNING", "Warning"),
        ("ERROR", "Error"),
        ("CRITICAL", "Critical"),
    ] {
        insert_lookup_row(db, EventLevel::Table, EventLevel::Id, EventLevel::Description, id, description).await?;
    }

    for (id, description) in [
        ("NEW", "New event"),
        ("ONGOING", "Ongoing event"),
        ("CLOSED", "Closed event"),
    ] {
        insert_lookup_row(db, EventState::Table, EventState::Id, EventState::Description, id, description).await?;
    }

    for (id, description) in [
        ("TIMESERIES", "Timeseries"),
        ("SITE", "Site"),
        ("BUILDING", "Building"),
        ("FLOOR", "Floor"),
        ("SPACE", "Space"),
        ("SENSOR", "Sensor"),
    ] {
        insert_lookup_row(db, EventTarget::Table, EventTarget::Id, EventTarget::Description, id, description).await?;
    }

    db.execute(Statement::from_string(
        manager.get_database_backend(),
        "INSERT INTO event_category (id, description, parent) VALUES \
         ('ABNORMAL_TIMESTAMPS', 'Abnormal timestamps in timeseries', NULL), \
         ('observation_missing', 'Observation timestamp is missing', 'ABNORMAL_TIMESTAMPS'), \
         ('observation_interval_too_large', 'Observation timestamp interval is too large compared to the timeseries observation interval', 'ABNORMAL_TIMESTAMPS'), \
         ('observation_interval_too_short', 'Observation timestamp interval is too short compared to the timeseries observation interval', 'ABNORMAL_TIMESTAMPS'), \
         ('reception_interval_too_large', 'Reception timestamp interval is too large compared to the timeseries reception interval', 'ABNORMAL_TIMESTAMPS'), \
         ('reception_interval_too_short', 'Reception timestamp interval is too short compared to the timeseries reception interval', 'ABNORMAL_TIMESTAMPS'), \
         ('ABNORMAL_MEASURE_VALUES', 'Abnormal measure values in timeseries', NULL), \
         ('out_of_range', 'Measure value is out of range', 'ABNORMAL_MEASURE_VALUES')"
            .to_string(),
    ))
    .await?;

    Ok(())
}

async fn insert_lookup_row(
    db: &SchemaManagerConnection<'_>,
    table: impl Iden + 'static,
    id_col: impl Iden + 'static,
    desc_col: impl Iden + 'static,
    id: &str,
    description: &str,
) -> Result<(), DbErr> {
    let stmt = Query::insert()
        .into_table(table)
        .columns([id_col, desc_col])
        .values_panic([id.into(), description.into()])
        .to_owned();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}

#[derive(DeriveIden)]
enum Timeseries {
    Table,
    Id,
    Name,
    Description,
    Unit,
    MinValue,
    MaxValue,
}

#[derive(DeriveIden)]
enum TimeseriesData {
    Table,
    TimeseriesId,
    Timestamp,
    Value,
}

#[derive(DeriveIden)]
enum MqttBroker {
    Table,
    Id,
    Host,
    Port,
    ProtocolVersion,
    Transport,
    IsAuthRequired,
    UseTls,
    TlsVersion,
    TlsVerifymode,
    TlsCertificate,
}

#[derive(DeriveIden)]
enum MqttSubscriber {
    Table,
    Id,
    BrokerId,
    IsEnabled,
    KeepAlive,
    UsePersistentSession,
    SessionExpiry,
    Username,
    Password,
    IsConnected,
    TimestampLastConnection,
}

#[derive(DeriveIden)]
enum MqttPayloadDecoder {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum MqttPayloadField {
    Table,
    Id,
    PayloadDecoderId,
    Name,
}

#[derive(DeriveIden)]
enum MqttTopic {
    Table,
    Id,
    Name,
    Qos,
    Description,
    PayloadDecoderId,
    IsEnabled,
}

#[derive(DeriveIden)]
enum MqttTopicByBroker {
    Table,
    TopicId,
    BrokerId,
    IsEnabled,
}

#[derive(DeriveIden)]
enum MqttTopicBySubscriber {
    Table,
    TopicId,
    SubscriberId,
    IsSubscribed,
    TimestampLastSubscription,
    IsEnabled,
}

#[derive(DeriveIden)]
enum MqttTopicLink {
    Table,
    TopicId,
    PayloadFieldId,
    TimeseriesId,
}

#[derive(DeriveIden)]
enum EventCategory {
    Table,
    Id,
    Description,
    Parent,
}

#[derive(DeriveIden)]
enum EventState {
    Table,
    Id,
    Description,
}

#[derive(DeriveIden)]
enum EventLevel {
    Table,
    Id,
    Description,
}

#[derive(DeriveIden)]
enum EventTarget {
    Table,
    Id,
    Description,
}

#[derive(DeriveIden)]
enum Event {
    Table,
    Id,
    Category,
    Level,
    State,
    Source,
    TargetType,
    TargetId,
    TimestampStart,
    TimestampEnd,
    TimestampLastUpdate,
    Description,
}
