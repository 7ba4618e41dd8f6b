diesel::table! {
    comments (id) {
        id -> Integer,
        post_id -> Integer,
        author_id -> Integer,
        body -> Text,
        creation_date -> Timestamp,
    }
}

diesel::table! {
    follows (id) {
        id -> Integer,
        follower_id -> Integer,
        followed_id -> Integer,
    }
}

diesel::table! {
    groups (id) {
        id -> Integer,
        title -> Varchar,
        slug -> Varchar,
        description -> Text,
    }
}

diesel::table! {
    medias (id) {
        id -> Integer,
        file_path -> Text,
        alt_text -> Text,
        owner_id -> Integer,
    }
}

diesel::table! {
    posts (id) {
        id -> Integer,
        author_id -> Integer,
        group_id -> Nullable<Integer>,
        title -> Varchar,
        body -> Text,
        cover_id -> Nullable<Integer>,
        creation_date -> Timestamp,
    }
}

diesel::table! {
    users (id) {
        id -> Integer,
        username -> Varchar,
        email -> Varchar,
        hashed_password -> Varchar,
        creation_date -> Timestamp,
    }
}

diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(comments -> users (author_id));
diesel::joinable!(medias -> users (owner_id));
diesel::joinable!(posts -> groups (group_id));
diesel::joinable!(posts -> medias (cover_id));
diesel::joinable!(posts -> users (author_id));

diesel::allow_tables_to_appear_in_same_query!(
    comments, follows, groups, medias, posts, users,
);
