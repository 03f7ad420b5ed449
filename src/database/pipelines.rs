//! Aggregation pipelines for the joined views the API serves.
//!
//! Every builder is a pure function returning the stages as data; the MongoDB
//! backend runs them and decodes the output into the view structs in
//! `crate::models`.

use bson::{doc, oid::ObjectId, Document};

use crate::models::{PageRequest, VideoFilter};

pub const USERS: &str = "users";
pub const VIDEOS: &str = "videos";
pub const TWEETS: &str = "tweets";
pub const COMMENTS: &str = "comments";
pub const LIKES: &str = "likes";
pub const SUBSCRIPTIONS: &str = "subscriptions";
pub const PLAYLISTS: &str = "playlists";

fn user_summary_projection() -> Document {
    doc! { "$project": { "userName": 1, "fullName": 1, "avatar": 1 } }
}

/// Replace `field` (a user id) with that user's public card
fn lookup_user_summary(field: &str) -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": USERS,
                "localField": field,
                "foreignField": "_id",
                "as": field,
                "pipeline": [user_summary_projection()],
            }
        },
        doc! { "$unwind": format!("${field}") },
    ]
}

/// `docs` holds the requested page, `total` a single `{count}` document
fn paginated_facet(page: PageRequest, per_doc: Vec<Document>) -> Document {
    let mut docs = vec![
        doc! { "$skip": page.skip() as i64 },
        doc! { "$limit": page.limit as i64 },
    ];
    docs.extend(per_doc);

    doc! {
        "$facet": {
            "docs": docs,
            "total": [{ "$count": "count" }],
        }
    }
}

pub fn user_tweets(user_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "_id": user_id } },
        doc! {
            "$lookup": {
                "from": TWEETS,
                "localField": "_id",
                "foreignField": "owner",
                "as": "tweets",
                "pipeline": [
                    { "$sort": { "createdAt": -1 } },
                    { "$project": { "content": 1 } },
                ],
            }
        },
        doc! {
            "$project": { "userName": 1, "fullName": 1, "avatar": 1, "tweets": 1 }
        },
    ]
}

pub fn video_with_owner(video_id: ObjectId) -> Vec<Document> {
    let mut stages = vec![doc! { "$match": { "_id": video_id } }];
    stages.extend(lookup_user_summary("owner"));
    stages
}

pub fn video_comments(video_id: ObjectId, page: PageRequest) -> Vec<Document> {
    vec![
        doc! { "$match": { "video": video_id } },
        doc! { "$sort": { "createdAt": -1, "_id": -1 } },
        paginated_facet(page, lookup_user_summary("owner")),
    ]
}

pub fn liked_videos(user_id: ObjectId) -> Vec<Document> {
    let mut video_stages = vec![doc! { "$match": { "isPublished": true } }];
    video_stages.extend(lookup_user_summary("owner"));

    vec![
        doc! { "$match": { "likedBy": user_id, "video": { "$exists": true } } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": VIDEOS,
                "localField": "video",
                "foreignField": "_id",
                "as": "video",
                "pipeline": video_stages,
            }
        },
        doc! { "$unwind": "$video" },
        doc! { "$replaceRoot": { "newRoot": "$video" } },
    ]
}

pub fn subscribed_channels(subscriber_id: ObjectId) -> Vec<Document> {
    let mut stages = vec![
        doc! { "$match": { "subscriber": subscriber_id } },
        doc! { "$sort": { "createdAt": -1 } },
    ];
    stages.extend(lookup_user_summary("channel"));
    stages.push(doc! { "$replaceRoot": { "newRoot": "$channel" } });
    stages
}

pub fn channel_subscribers(channel_id: ObjectId) -> Vec<Document> {
    let mut subscriber_stages = vec![doc! { "$sort": { "createdAt": -1 } }];
    subscriber_stages.extend(lookup_user_summary("subscriber"));
    subscriber_stages.push(doc! { "$replaceRoot": { "newRoot": "$subscriber" } });

    vec![
        doc! { "$match": { "channel": channel_id } },
        doc! {
            "$facet": {
                "subscribers": subscriber_stages,
                "count": [{ "$count": "total" }],
            }
        },
    ]
}

/// The `$match` document for a video listing
pub fn video_filter_match(filter: &VideoFilter) -> Document {
    let mut filter_doc = Document::new();
    if let Some(owner) = filter.owner {
        filter_doc.insert("owner", owner);
    }
    if !filter.include_unpublished {
        filter_doc.insert("isPublished", true);
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = regex::escape(search);
        filter_doc.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }
    filter_doc
}

pub fn list_videos(filter: &VideoFilter, page: PageRequest) -> Vec<Document> {
    let direction = if filter.ascending { 1 } else { -1 };
    let mut sort = Document::new();
    sort.insert(filter.sort_by.field_name(), direction);
    sort.insert("_id", direction);

    vec![
        doc! { "$match": video_filter_match(filter) },
        doc! { "$sort": sort },
        paginated_facet(page, lookup_user_summary("owner")),
    ]
}

pub fn channel_profile(user_name: &str, viewer_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "userName": user_name.trim().to_lowercase() } },
        doc! {
            "$lookup": {
                "from": SUBSCRIPTIONS,
                "localField": "_id",
                "foreignField": "channel",
                "as": "subscribers",
            }
        },
        doc! {
            "$lookup": {
                "from": SUBSCRIPTIONS,
                "localField": "_id",
                "foreignField": "subscriber",
                "as": "subscribedTo",
            }
        },
        doc! {
            "$addFields": {
                "subscribersCount": { "$size": "$subscribers" },
                "channelsSubscribedToCount": { "$size": "$subscribedTo" },
                "isSubscribed": {
                    "$cond": {
                        "if": { "$in": [viewer_id, "$subscribers.subscriber"] },
                        "then": true,
                        "else": false,
                    }
                },
            }
        },
        doc! {
            "$project": {
                "userName": 1,
                "fullName": 1,
                "email": 1,
                "avatar": 1,
                "coverImage": 1,
                "subscribersCount": 1,
                "channelsSubscribedToCount": 1,
                "isSubscribed": 1,
            }
        },
    ]
}

pub fn watch_history(user_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "_id": user_id } },
        doc! {
            "$lookup": {
                "from": VIDEOS,
                "localField": "watchHistory",
                "foreignField": "_id",
                "as": "watchedVideos",
                "pipeline": lookup_user_summary("owner"),
            }
        },
        // $lookup returns collection order; map back onto the order watched
        doc! {
            "$project": {
                "watchHistory": {
                    "$filter": {
                        "input": {
                            "$map": {
                                "input": "$watchHistory",
                                "as": "videoId",
                                "in": {
                                    "$arrayElemAt": [
                                        {
                                            "$filter": {
                                                "input": "$watchedVideos",
                                                "as": "video",
                                                "cond": { "$eq": ["$$video._id", "$$videoId"] },
                                            }
                                        },
                                        0,
                                    ]
                                },
                            }
                        },
                        "as": "video",
                        "cond": { "$ne": [{ "$type": "$$video" }, "missing"] },
                    }
                }
            }
        },
    ]
}

/// Video count, view sum and like count across one channel's videos
pub fn channel_stats(owner_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "owner": owner_id } },
        doc! {
            "$lookup": {
                "from": LIKES,
                "localField": "_id",
                "foreignField": "video",
                "as": "likes",
                "pipeline": [{ "$project": { "_id": 1 } }],
            }
        },
        doc! {
            "$group": {
                "_id": null,
                "totalVideos": { "$sum": 1 },
                "totalViews": { "$sum": "$views" },
                "totalLikes": { "$sum": { "$size": "$likes" } },
            }
        },
    ]
}

pub fn user_playlists(user_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "owner": user_id } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": VIDEOS,
                "localField": "videos",
                "foreignField": "_id",
                "as": "videos",
            }
        },
    ]
}

/// Update pipeline negating `isPublished` server-side
pub fn toggle_publish_update() -> Vec<Document> {
    vec![doc! {
        "$set": {
            "isPublished": { "$not": "$isPublished" },
            "updatedAt": "$$NOW",
        }
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoSortField;

    fn stage_name(stage: &Document) -> &str {
        stage.keys().next().map(String::as_str).unwrap_or_default()
    }

    #[test]
    fn test_user_tweets_shape() {
        let id = ObjectId::new();
        let pipeline = user_tweets(id);

        let names: Vec<&str> = pipeline.iter().map(stage_name).collect();
        assert_eq!(names, vec!["$match", "$lookup", "$project"]);
        assert_eq!(
            pipeline[0].get_document("$match").unwrap().get_object_id("_id").unwrap(),
            id
        );
        let lookup = pipeline[1].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), TWEETS);
        assert_eq!(lookup.get_str("foreignField").unwrap(), "owner");
    }

    #[test]
    fn test_video_comments_paginates_in_facet() {
        let pipeline = video_comments(ObjectId::new(), PageRequest::new(Some(3), Some(5)));
        let facet = pipeline[2].get_document("$facet").unwrap();
        let docs = facet.get_array("docs").unwrap();

        let skip = docs[0].as_document().unwrap().get_i64("$skip").unwrap();
        let limit = docs[1].as_document().unwrap().get_i64("$limit").unwrap();
        assert_eq!(skip, 10);
        assert_eq!(limit, 5);
        assert!(facet.get_array("total").is_ok());
    }

    #[test]
    fn test_video_filter_escapes_search() {
        let filter = VideoFilter {
            search: Some("a.b(".to_string()),
            ..Default::default()
        };
        let filter_doc = video_filter_match(&filter);

        assert!(filter_doc.get_bool("isPublished").unwrap());
        let branches = filter_doc.get_array("$or").unwrap();
        let title = branches[0]
            .as_document()
            .unwrap()
            .get_document("title")
            .unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"a\.b\(");
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_owner_listing_can_include_unpublished() {
        let owner = ObjectId::new();
        let filter = VideoFilter {
            owner: Some(owner),
            include_unpublished: true,
            ..Default::default()
        };
        let filter_doc = video_filter_match(&filter);

        assert_eq!(filter_doc.get_object_id("owner").unwrap(), owner);
        assert!(filter_doc.get("isPublished").is_none());
        assert!(filter_doc.get("$or").is_none());
    }

    #[test]
    fn test_list_videos_sort_direction() {
        let filter = VideoFilter {
            sort_by: VideoSortField::Views,
            ascending: true,
            ..Default::default()
        };
        let pipeline = list_videos(&filter, PageRequest::new(None, None));
        let sort = pipeline[1].get_document("$sort").unwrap();

        assert_eq!(sort.keys().next().unwrap(), "views");
        assert_eq!(sort.get_i32("views").unwrap(), 1);
    }

    #[test]
    fn test_channel_profile_lowercases_user_name() {
        let pipeline = channel_profile(" MyChannel ", ObjectId::new());
        let matched = pipeline[0].get_document("$match").unwrap();
        assert_eq!(matched.get_str("userName").unwrap(), "mychannel");

        let names: Vec<&str> = pipeline.iter().map(stage_name).collect();
        assert_eq!(names, vec!["$match", "$lookup", "$lookup", "$addFields", "$project"]);
    }

    #[test]
    fn test_liked_videos_replaces_root() {
        let pipeline = liked_videos(ObjectId::new());
        let last = pipeline.last().unwrap();
        assert_eq!(
            last.get_document("$replaceRoot").unwrap().get_str("newRoot").unwrap(),
            "$video"
        );
    }

    #[test]
    fn test_channel_subscribers_counts_total() {
        let pipeline = channel_subscribers(ObjectId::new());
        let facet = pipeline[1].get_document("$facet").unwrap();
        let count = facet.get_array("count").unwrap()[0].as_document().unwrap();
        assert_eq!(count.get_str("$count").unwrap(), "total");
    }

    #[test]
    fn test_toggle_publish_is_pipeline_update() {
        let update = toggle_publish_update();
        let set = update[0].get_document("$set").unwrap();
        assert_eq!(
            set.get_document("isPublished").unwrap().get_str("$not").unwrap(),
            "$isPublished"
        );
    }

    #[test]
    fn test_watch_history_keeps_watch_order() {
        let pipeline = watch_history(ObjectId::new());

        let names: Vec<&str> = pipeline.iter().map(stage_name).collect();
        assert_eq!(names, vec!["$match", "$lookup", "$project"]);

        let lookup = pipeline[1].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("as").unwrap(), "watchedVideos");

        let history = pipeline[2]
            .get_document("$project")
            .unwrap()
            .get_document("watchHistory")
            .unwrap()
            .get_document("$filter")
            .unwrap();
        let map = history
            .get_document("input")
            .unwrap()
            .get_document("$map")
            .unwrap();
        assert_eq!(map.get_str("input").unwrap(), "$watchHistory");
    }
}
