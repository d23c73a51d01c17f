diesel::table! {
    slots (id) {
        id -> Uuid,
        display_id -> Varchar,
        day -> Int4,
        month -> Int4,
        year -> Int4,
        start_minute -> Int4,
        end_minute -> Int4,
        representative -> Varchar,
        client_name -> Nullable<Varchar>,
        client_email -> Nullable<Varchar>,
        client_phone -> Nullable<Varchar>,
        client_school -> Nullable<Varchar>,
        client_id_number -> Nullable<Varchar>,
        client_preferred_day -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
